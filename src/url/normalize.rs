use crate::{CrawlTarget, UrlError, UrlResult};
use url::Url;

/// Normalizes a discovered link into a crawl target
///
/// # Normalization Steps
///
/// 1. Resolve the href against the page it was discovered on (relative
///    hrefs become absolute)
/// 2. Reject non-HTTP(S) schemes (`javascript:`, `mailto:`, `tel:`, data
///    URIs and anything else a browser would not navigate to)
/// 3. Strip the fragment, so `/about#team` and `/about` are the same target
///
/// The query string is kept: it is part of the target's identity even though
/// the path mapper later drops it when choosing a local file.
///
/// # Arguments
///
/// * `href` - The raw href attribute value
/// * `base` - The URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(CrawlTarget)` - Normalized target
/// * `Err(UrlError)` - The href is unusable for traversal
///
/// # Examples
///
/// ```
/// use espejo::normalize_target;
/// use url::Url;
///
/// let base = Url::parse("https://kinsu.mx/").unwrap();
/// let target = normalize_target("/about#team", &base).unwrap();
/// assert_eq!(target.as_str(), "https://kinsu.mx/about");
/// ```
pub fn normalize_target(href: &str, base: &Url) -> UrlResult<CrawlTarget> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Parse("empty href".to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{href}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(CrawlTarget::new(url))
}

/// Normalizes the root URL supplied on the command line
///
/// A scheme-less argument (e.g. `kinsu.mx`) gets `https://` prepended
/// before parsing, matching how operators usually type the root.
///
/// # Arguments
///
/// * `arg` - The raw command-line argument
///
/// # Returns
///
/// * `Ok(CrawlTarget)` - The normalized root target
/// * `Err(UrlError)` - The argument is not a usable URL
pub fn root_from_arg(arg: &str) -> UrlResult<CrawlTarget> {
    let trimmed = arg.trim();

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(CrawlTarget::new(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://kinsu.mx/").unwrap()
    }

    #[test]
    fn test_relative_href_resolved() {
        let target = normalize_target("/faq/", &base()).unwrap();
        assert_eq!(target.as_str(), "https://kinsu.mx/faq/");
    }

    #[test]
    fn test_fragment_stripped() {
        let target = normalize_target("/about#team", &base()).unwrap();
        assert_eq!(target.as_str(), "https://kinsu.mx/about");
    }

    #[test]
    fn test_fragment_only_href_collapses_to_page() {
        let page = Url::parse("https://kinsu.mx/about").unwrap();
        let target = normalize_target("#team", &page).unwrap();
        assert_eq!(target.as_str(), "https://kinsu.mx/about");
    }

    #[test]
    fn test_absolute_href_kept() {
        let target = normalize_target("https://other.com/page", &base()).unwrap();
        assert_eq!(target.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_query_kept() {
        let target = normalize_target("/search?q=seguro", &base()).unwrap();
        assert_eq!(target.as_str(), "https://kinsu.mx/search?q=seguro");
    }

    #[test]
    fn test_javascript_href_rejected() {
        assert!(matches!(
            normalize_target("javascript:void(0)", &base()),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_mailto_href_rejected() {
        assert!(normalize_target("mailto:hola@kinsu.mx", &base()).is_err());
    }

    #[test]
    fn test_empty_href_rejected() {
        assert!(normalize_target("  ", &base()).is_err());
    }

    #[test]
    fn test_root_without_scheme_gets_https() {
        let target = root_from_arg("kinsu.mx").unwrap();
        assert_eq!(target.as_str(), "https://kinsu.mx/");
        assert_eq!(target.host(), Some("kinsu.mx"));
    }

    #[test]
    fn test_root_with_scheme_unchanged() {
        let target = root_from_arg("http://kinsu.mx/inicio").unwrap();
        assert_eq!(target.as_str(), "http://kinsu.mx/inicio");
    }

    #[test]
    fn test_root_invalid() {
        assert!(root_from_arg("not a url").is_err());
    }
}
