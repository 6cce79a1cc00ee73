//! Espejo: an offline mirror for dynamically-rendered websites
//!
//! This crate renders each page of a client-side-routed site through a real
//! browser engine, captures every static sub-resource the page requests,
//! rewrites in-page references so the mirror is self-contained, and follows
//! same-site links until the frontier drains.

pub mod config;
pub mod crawler;
pub mod mirror;
pub mod render;
pub mod url;

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Espejo operations
#[derive(Debug, Error)]
pub enum EspejoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation timed out for {url}")]
    NavigationTimeout { url: String },

    #[error("Resource fetch failed for {url}: {source}")]
    ResourceFetch { url: String, source: reqwest::Error },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to write {path}: {source}")]
    PageWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Espejo operations
pub type Result<T> = std::result::Result<T, EspejoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::MirrorConfig;
pub use crawler::{mirror_site, Coordinator, CrawlSummary};
pub use mirror::{PathMapper, ResourceClass, ResourceStore};
pub use url::{in_scope, normalize_target, root_from_arg, CrawlTarget};
