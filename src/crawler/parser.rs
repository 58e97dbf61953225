//! HTML link extraction
//!
//! The extractor only collects raw `href` strings. Resolving them against a
//! base URL and filtering schemes happens in `crate::url::resolve_href`.

use scraper::{Html, Selector};

/// Turns page markup into the raw hrefs it links to
pub trait LinkExtractor: Send + Sync {
    fn extract_links(&self, html: &str) -> Vec<String>;
}

/// Default extractor that reads `<a href>` elements with `scraper`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `<link>`, `<script>` and `<img>` references
///
/// **Note:** `rel="nofollow"` links ARE returned
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}
