//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlTarget`: The immutable description of one site to crawl
//! - `CrawlState`: Lifecycle of a single domain crawl (idle, running, completed, ...)
//! - `VisitedSet` / `ProductSet`: The per-domain URL sets owned by one frontier

mod crawl_state;
mod target;

// Re-export main types
pub use crawl_state::CrawlState;
pub use target::CrawlTarget;

use std::collections::{BTreeSet, HashSet};

/// URLs already enqueued or classified during one domain crawl
pub type VisitedSet = HashSet<String>;

/// Product URLs discovered for one domain; kept sorted for stable output
pub type ProductSet = BTreeSet<String>;
