//! URL handling module for pdp-harvest
//!
//! This module provides product-URL classification, domain scoping,
//! domain extraction and href resolution. Every function here is pure.

mod classifier;
mod domain;
mod resolve;
mod scope;

// Re-export main functions
pub use classifier::{PatternRule, UrlClassifier, UrlKind, DEFAULT_PRODUCT_PATTERNS};
pub use domain::{extract_domain, file_stem_for, parse_root};
pub use resolve::resolve_href;
pub use scope::in_scope;
