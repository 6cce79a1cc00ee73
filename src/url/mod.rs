//! URL handling module for Espejo
//!
//! This module provides target normalization, the crawl-target identity type,
//! and the domain scope filter that restricts traversal to the root host.

mod normalize;
mod scope;

use url::Url;

// Re-export main functions
pub use normalize::{normalize_target, root_from_arg};
pub use scope::in_scope;

/// A normalized crawl target: an absolute URL with its fragment stripped.
///
/// Two targets are the same entity iff their normalized strings are equal,
/// so the wrapped string is the identity used by the frontier's seen-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    url: Url,
}

impl CrawlTarget {
    /// Wraps an already-normalized URL. Use [`normalize_target`] or
    /// [`root_from_arg`] to produce one.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// The underlying URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The normalized string form (the target's identity)
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The host component, lowercased by the URL parser
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

impl std::fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}
