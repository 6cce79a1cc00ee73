//! Site crawling and mirroring
//!
//! This module wires the pieces of a run together. The [`Frontier`] holds
//! the visit queue and the seen-set, the [`ResourceInterceptor`] captures
//! sub-resources as pages load, and the [`Coordinator`] drives rendering
//! workers over the frontier until it drains.

pub mod coordinator;
pub mod frontier;
pub mod interceptor;

pub use coordinator::{Coordinator, CrawlSummary};
pub use frontier::Frontier;
pub use interceptor::{build_http_client, ResourceInterceptor};

use std::sync::Arc;

use crate::config::MirrorConfig;
use crate::render::PageRenderer;
use crate::url::CrawlTarget;
use crate::Result;

/// Mirrors the site rooted at `root` into the configured output directory
///
/// Convenience entry point that builds a [`Coordinator`] and runs it to
/// completion.
///
/// # Arguments
///
/// * `config` - Validated run configuration
/// * `root` - The normalized root URL of the site
/// * `renderer` - Renderer used to load pages and surface their requests
///
/// # Returns
///
/// The run totals, or an error if the run could not even start. Failures
/// of individual pages and resources are logged and counted, never fatal.
pub async fn mirror_site<R: PageRenderer + 'static>(
    config: MirrorConfig,
    root: CrawlTarget,
    renderer: Arc<R>,
) -> Result<CrawlSummary> {
    let coordinator = Coordinator::new(config, root, renderer)?;
    coordinator.run().await
}
