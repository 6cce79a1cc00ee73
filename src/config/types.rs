use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::mirror::ResourceClass;

/// Main configuration structure for a mirror run
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Base directory the mirror is written under
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of concurrent page renders (each worker owns its own tab).
    /// Breadth-first level order is only strict at 1; above that, queue
    /// order is best-effort FIFO.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-navigation timeout in milliseconds
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Network quiescence window in milliseconds: a page is considered
    /// rendered once no request has been seen for this long
    #[serde(rename = "network-idle-ms", default = "default_network_idle_ms")]
    pub network_idle_ms: u64,

    /// Also capture XHR/fetch responses (API payloads), not just static
    /// assets
    #[serde(rename = "capture-xhr", default)]
    pub capture_xhr: bool,

    /// Safety ceiling on the number of targets admitted to the frontier.
    /// None reproduces the original unbounded traversal.
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            network_idle_ms: default_network_idle_ms(),
            capture_xhr: false,
            max_pages: None,
        }
    }
}

impl MirrorConfig {
    /// The set of resource classes the interceptor captures
    pub fn capture_classes(&self) -> HashSet<ResourceClass> {
        let mut classes = HashSet::from([
            ResourceClass::Image,
            ResourceClass::Stylesheet,
            ResourceClass::Script,
            ResourceClass::Font,
        ]);
        if self.capture_xhr {
            classes.insert(ResourceClass::Xhr);
            classes.insert(ResourceClass::Fetch);
        }
        classes
    }

    /// Per-navigation timeout
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Network quiescence window
    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("descarga_offline")
}

fn default_concurrency() -> u32 {
    1
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_network_idle_ms() -> u64 {
    500
}
