use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// The port is not part of the result.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pdp_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Shop.Example:8443/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.shop.example".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a crawl root and returns it together with its domain key
///
/// Only absolute http(s) URLs with a host are accepted.
pub fn parse_root(root: &str) -> UrlResult<(Url, String)> {
    let url = Url::parse(root.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let domain = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
    Ok((url, domain))
}

/// Turns a domain key into a string that is safe to use as a file stem
pub fn file_stem_for(domain_key: &str) -> String {
    domain_key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
