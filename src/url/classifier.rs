use crate::config::PatternEntry;
use crate::ConfigError;
use regex::{Regex, RegexBuilder};

/// Product rules used when the configuration does not list any
pub const DEFAULT_PRODUCT_PATTERNS: &[&str] = &[
    r"/product/",
    r"/p/",
    r"/item/",
    r"/shop/",
    r"-p-",
    r"/pdp/",
    r"/products/",
    r"[0-9]+$",
];

/// What a discovered URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// A product detail page - recorded, never traversed
    Product,
    /// Any other page - a candidate for further traversal
    Navigational,
}

/// A single product-URL rule
#[derive(Debug, Clone)]
pub enum PatternRule {
    /// Matches when the lower-cased URL contains this lower-cased substring
    Literal(String),
    /// Matches when the regex finds a match anywhere in the URL
    Regex(Regex),
}

impl PatternRule {
    /// Builds a substring rule
    pub fn literal(pattern: &str) -> Self {
        Self::Literal(pattern.to_lowercase())
    }

    /// Compiles a case-insensitive regex rule
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Tests the rule against an already lower-cased URL
    fn matches(&self, lowered_url: &str) -> bool {
        match self {
            Self::Literal(needle) => lowered_url.contains(needle.as_str()),
            Self::Regex(re) => re.is_match(lowered_url),
        }
    }
}

impl TryFrom<&PatternEntry> for PatternRule {
    type Error = ConfigError;

    fn try_from(entry: &PatternEntry) -> Result<Self, Self::Error> {
        match entry {
            PatternEntry::Plain(pattern) | PatternEntry::Regex { regex: pattern } => {
                Self::regex(pattern)
            }
            PatternEntry::Literal { literal } => Ok(Self::literal(literal)),
        }
    }
}

/// Classifies URLs as product or navigational pages
///
/// Rules are tried in order and the first match wins. The classifier holds
/// no mutable state, so one instance can be shared by every domain crawl.
///
/// # Examples
///
/// ```
/// use pdp_harvest::url::{PatternRule, UrlClassifier, UrlKind};
///
/// let classifier = UrlClassifier::new(vec![PatternRule::literal("/p/")]);
/// assert_eq!(classifier.classify("https://shop.example/P/123"), UrlKind::Product);
/// assert_eq!(classifier.classify("https://shop.example/about"), UrlKind::Navigational);
/// ```
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    rules: Vec<PatternRule>,
}

impl UrlClassifier {
    /// Creates a classifier from an ordered rule list
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Compiles a classifier from configuration entries
    ///
    /// # Returns
    ///
    /// * `Ok(UrlClassifier)` - Every pattern compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn from_entries(entries: &[PatternEntry]) -> Result<Self, ConfigError> {
        let rules = entries
            .iter()
            .map(PatternRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Classifier with the built-in product rules
    pub fn with_defaults() -> Self {
        let rules = DEFAULT_PRODUCT_PATTERNS
            .iter()
            .filter_map(|pattern| PatternRule::regex(pattern).ok())
            .collect();
        Self::new(rules)
    }

    /// Classifies a URL
    ///
    /// The URL is lower-cased before matching, so classification is
    /// case-insensitive for both literal and regex rules.
    pub fn classify(&self, url: &str) -> UrlKind {
        let lowered = url.to_lowercase();
        if self.rules.iter().any(|rule| rule.matches(&lowered)) {
            UrlKind::Product
        } else {
            UrlKind::Navigational
        }
    }

    /// Number of configured rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
