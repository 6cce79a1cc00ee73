//! Crawl coordinator - main mirroring orchestration
//!
//! Drives the frontier with a small bounded worker pool. Each worker pulls
//! a target, renders it with interception attached, rewrites the markup
//! against everything captured so far, persists the page, and feeds the
//! in-scope discovered links back into the frontier. The run ends when the
//! frontier drains and no render is in flight.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::config::MirrorConfig;
use crate::crawler::frontier::Frontier;
use crate::crawler::interceptor::{build_http_client, ResourceInterceptor};
use crate::mirror::{rewrite_page, PathMapper, ResourceStore};
use crate::render::{InterceptHandler, PageRenderer};
use crate::url::{in_scope, normalize_target, CrawlTarget};
use crate::{EspejoError, Result, UrlError};

/// Totals reported when a run finishes
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub resources_captured: usize,
    pub elapsed: Duration,
}

/// State shared by every worker in the pool
struct Shared {
    config: MirrorConfig,
    root_domain: String,
    mapper: PathMapper,
    store: Arc<ResourceStore>,
    interceptor: Arc<ResourceInterceptor>,
    frontier: Mutex<Frontier>,
    in_flight: AtomicUsize,
}

/// Main crawl coordinator
pub struct Coordinator<R: PageRenderer + 'static> {
    shared: Arc<Shared>,
    renderer: Arc<R>,
}

impl<R: PageRenderer + 'static> Coordinator<R> {
    /// Creates a coordinator for one run rooted at `root`
    ///
    /// The root's host becomes the domain scope for the whole run; the
    /// mirror is laid out under `<output-dir>/<root-domain>`.
    pub fn new(config: MirrorConfig, root: CrawlTarget, renderer: Arc<R>) -> Result<Self> {
        let root_domain = root
            .host()
            .ok_or(UrlError::MissingHost)?
            .to_string();

        std::fs::create_dir_all(&config.output_dir)?;

        let mapper = PathMapper::new(&config.output_dir, &root_domain);
        let store = Arc::new(ResourceStore::new());
        let client = build_http_client()?;
        let interceptor = Arc::new(ResourceInterceptor::new(
            client,
            mapper.clone(),
            Arc::clone(&store),
            config.capture_classes(),
        ));

        let frontier = Mutex::new(Frontier::new(root, config.max_pages));

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                root_domain,
                mapper,
                store,
                interceptor,
                frontier,
                in_flight: AtomicUsize::new(0),
            }),
            renderer,
        })
    }

    /// Runs the crawl until the frontier drains
    pub async fn run(&self) -> Result<CrawlSummary> {
        let start = Instant::now();
        let workers = self.shared.config.concurrency.max(1) as usize;
        tracing::info!(
            "Mirroring {} with {} worker(s) into {}",
            self.shared.root_domain,
            workers,
            self.shared.mapper.root().display()
        );

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let shared = Arc::clone(&self.shared);
            let renderer = Arc::clone(&self.renderer);
            pool.spawn(async move {
                worker_loop(worker_id, shared, renderer).await;
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let summary = {
            let frontier = self.shared.frontier.lock().unwrap();
            CrawlSummary {
                pages_visited: frontier.visited(),
                pages_failed: frontier.failed(),
                resources_captured: self.shared.store.len(),
                elapsed: start.elapsed(),
            }
        };

        tracing::info!(
            "Run complete: {} pages saved, {} failed, {} resources captured in {:?}",
            summary.pages_visited,
            summary.pages_failed,
            summary.resources_captured,
            summary.elapsed
        );

        Ok(summary)
    }
}

/// Pulls targets until the frontier is empty and nothing is in flight
///
/// An empty queue is not the end of the run while a sibling worker still
/// renders: its page may discover new links, so idle workers poll.
async fn worker_loop<R: PageRenderer>(worker_id: usize, shared: Arc<Shared>, renderer: Arc<R>) {
    loop {
        let target = {
            let mut frontier = shared.frontier.lock().unwrap();
            let target = frontier.pop();
            if target.is_some() {
                shared.in_flight.fetch_add(1, Ordering::SeqCst);
            }
            target
        };

        match target {
            Some(target) => {
                process_target(&shared, renderer.as_ref(), &target).await;
                shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
            None => {
                if shared.in_flight.load(Ordering::SeqCst) == 0 {
                    tracing::debug!("Worker {} draining: frontier empty", worker_id);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

/// Renders one target, persists the rewritten page, and enqueues its links
async fn process_target<R: PageRenderer>(shared: &Shared, renderer: &R, target: &CrawlTarget) {
    tracing::info!("Visiting: {}", target);

    let handler: Arc<dyn InterceptHandler> = shared.interceptor.clone();
    let rendered = match renderer
        .render(target.url(), handler, shared.config.navigation_timeout())
        .await
    {
        Ok(rendered) => rendered,
        Err(e) => {
            // Terminal for this target: logged, never retried
            tracing::warn!("Could not render {}: {}", target, e);
            shared.frontier.lock().unwrap().mark_failed();
            return;
        }
    };

    match save_page(shared, target, &rendered.html) {
        Ok(path) => tracing::info!("Saved page at {}", path.display()),
        Err(e) => {
            // Surfaced to the operator but the traversal continues
            tracing::warn!("Could not save {}: {}", target, e);
        }
    }
    shared.frontier.lock().unwrap().mark_visited();

    let mut admitted = 0;
    for href in &rendered.links {
        let link = match normalize_target(href, target.url()) {
            Ok(link) => link,
            Err(_) => continue,
        };

        if !in_scope(link.url(), &shared.root_domain) {
            continue;
        }

        if shared.frontier.lock().unwrap().try_enqueue(link) {
            admitted += 1;
        }
    }

    if admitted > 0 {
        tracing::debug!("Discovered {} new target(s) on {}", admitted, target);
    }
}

/// Rewrites a rendered page against the store and writes it to disk
///
/// Only resources captured strictly before this point are substituted;
/// later captures never retroactively rewrite earlier pages.
fn save_page(shared: &Shared, target: &CrawlTarget, html: &str) -> Result<PathBuf> {
    let page_path = shared.mapper.page_path(target.url())?;
    let rules = shared.store.rewrite_rules();
    let rewritten = rewrite_page(html, &page_path, &rules);

    std::fs::write(&page_path, rewritten).map_err(|source| EspejoError::PageWrite {
        path: page_path.clone(),
        source,
    })?;

    Ok(page_path)
}
