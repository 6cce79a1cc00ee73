use url::Url;

/// Decides whether a discovered link is in scope for traversal
///
/// True iff the URL's host component exactly equals the root domain. There
/// is no subdomain matching: `blog.kinsu.mx` is out of scope for a crawl
/// rooted at `kinsu.mx`.
///
/// This filter applies to page links only. Sub-resources are always
/// captured regardless of their own host, since a mirror must keep the
/// CDN-hosted assets a page depends on.
///
/// # Examples
///
/// ```
/// use espejo::in_scope;
/// use url::Url;
///
/// let same = Url::parse("https://kinsu.mx/faq/").unwrap();
/// let other = Url::parse("https://cdn.example.com/font.woff2").unwrap();
/// assert!(in_scope(&same, "kinsu.mx"));
/// assert!(!in_scope(&other, "kinsu.mx"));
/// ```
pub fn in_scope(url: &Url, root_domain: &str) -> bool {
    url.host_str() == Some(root_domain)
}
