use crate::url::parse_root;
use crate::UrlResult;
use url::Url;

/// One site to crawl
///
/// Fields are private so a target cannot change once a crawl has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    root_url: Url,
    domain_key: String,
    max_depth: u32,
}

impl CrawlTarget {
    /// Creates a target from a root URL string
    ///
    /// # Arguments
    ///
    /// * `root` - Absolute http(s) URL of the seed page
    /// * `max_depth` - Largest BFS distance from the root that will be fetched
    pub fn new(root: &str, max_depth: u32) -> UrlResult<Self> {
        let (root_url, domain_key) = parse_root(root)?;
        Ok(Self {
            root_url,
            domain_key,
            max_depth,
        })
    }

    /// The seed page; also the base every href is resolved against
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// Lower-cased host used for scoping and checkpoint naming
    pub fn domain_key(&self) -> &str {
        &self.domain_key
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
