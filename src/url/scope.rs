use crate::state::CrawlTarget;
use crate::url::extract_domain;
use url::Url;

/// Checks whether a discovered URL stays within a crawl target's domain
///
/// The URL's lower-cased host must equal the target's domain key exactly.
/// Scheme and port are ignored and subdomains are not folded together.
/// A URL that cannot be parsed is out of scope rather than an error.
///
/// # Examples
///
/// ```
/// use pdp_harvest::{in_scope, CrawlTarget};
///
/// let target = CrawlTarget::new("https://shop.example/", 2).unwrap();
/// assert!(in_scope("http://SHOP.example/about", &target));
/// assert!(!in_scope("https://blog.shop.example/", &target));
/// assert!(!in_scope("not a url", &target));
/// ```
pub fn in_scope(url: &str, target: &CrawlTarget) -> bool {
    match Url::parse(url) {
        Ok(parsed) => extract_domain(&parsed).as_deref() == Some(target.domain_key()),
        Err(_) => false,
    }
}
