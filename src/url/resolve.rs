use url::Url;

/// Resolves a raw href against a base URL
///
/// Returns None if the link should be dropped:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that cannot be joined onto the base
/// - non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use pdp_harvest::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example/").unwrap();
/// let resolved = resolve_href(&base, "/p/123").unwrap();
/// assert_eq!(resolved.as_str(), "https://shop.example/p/123");
/// assert!(resolve_href(&base, "javascript:void(0)").is_none());
/// ```
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
