//! Resource interceptor
//!
//! For every sub-resource request the renderer issues while a page loads,
//! the interceptor decides whether to capture it. Captured resources are
//! fetched once, written to their mapped local path, recorded in the shared
//! store, and the bytes are handed back to the renderer so the page
//! finishes rendering from the mirrored copy. Anything that goes wrong for
//! a single resource degrades to a pass-through: the page must not abort
//! because one asset failed to mirror.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::mirror::{PathMapper, ResourceClass, ResourceRecord, ResourceStore};
use crate::render::{FetchedResponse, InterceptDecision, InterceptHandler, ResourceRequest};
use crate::{EspejoError, Result};

/// Headers that must not be replayed to the renderer: the HTTP client has
/// already decoded the body, so encoding and length no longer match.
const STRIPPED_HEADERS: &[&str] = &["content-encoding", "content-length", "transfer-encoding"];

/// Builds the HTTP client the interceptor fetches resources with
pub fn build_http_client() -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("espejo/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Captures sub-resources requested during page rendering
pub struct ResourceInterceptor {
    client: Client,
    mapper: PathMapper,
    store: Arc<ResourceStore>,
    capture: HashSet<ResourceClass>,
}

impl ResourceInterceptor {
    /// Creates an interceptor
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for capture fetches
    /// * `mapper` - Path mapper for the run's domain root
    /// * `store` - Shared resource store, also used as the fetch-once cache
    /// * `capture` - Resource classes worth mirroring
    pub fn new(
        client: Client,
        mapper: PathMapper,
        store: Arc<ResourceStore>,
        capture: HashSet<ResourceClass>,
    ) -> Self {
        Self {
            client,
            mapper,
            store,
            capture,
        }
    }

    /// Replays an already-captured resource from disk
    fn replay(&self, record: &ResourceRecord) -> Result<FetchedResponse> {
        let body = std::fs::read(&record.local_path)?;
        Ok(FetchedResponse {
            status: record.status,
            headers: record.headers.clone(),
            body,
        })
    }

    /// Fetches a resource, persists it, and records it in the store
    async fn capture_resource(
        &self,
        url_str: &str,
        declared: ResourceClass,
    ) -> Result<FetchedResponse> {
        let url = Url::parse(url_str)?;

        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| EspejoError::ResourceFetch {
                    url: url_str.to_string(),
                    source,
                })?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !STRIPPED_HEADERS.contains(&name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|source| EspejoError::ResourceFetch {
                url: url_str.to_string(),
                source,
            })?
            .to_vec();

        let class = ResourceClass::classify(&url, declared);
        let local_path = self.mapper.resource_path(&url, class)?;
        write_atomic(&local_path, &body)?;

        tracing::debug!(
            "Captured {} ({} bytes) at {}",
            url_str,
            body.len(),
            local_path.display()
        );

        self.store.record(ResourceRecord {
            original_url: url_str.to_string(),
            class,
            local_path,
            status,
            headers: headers.clone(),
        });

        Ok(FetchedResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl InterceptHandler for ResourceInterceptor {
    async fn on_request(&self, request: ResourceRequest) -> InterceptDecision {
        // Outside the capture set (notably the top-level document itself):
        // pass the request through unmodified.
        if !self.capture.contains(&request.declared) {
            return InterceptDecision::Continue;
        }

        // A URL already captured this run is served from disk; each
        // resource is fetched and written exactly once.
        if let Some(record) = self.store.get(&request.url) {
            match self.replay(&record) {
                Ok(response) => return InterceptDecision::Fulfill(response),
                Err(e) => {
                    tracing::warn!("Could not replay captured {}: {}", request.url, e);
                }
            }
        }

        match self.capture_resource(&request.url, request.declared).await {
            Ok(response) => InterceptDecision::Fulfill(response),
            Err(e) => {
                // Fall back to the renderer's own live fetch for this one
                // asset; the page still renders, just unmirrored here.
                tracing::warn!("Failed to mirror {}: {}", request.url, e);
                InterceptDecision::Continue
            }
        }
    }
}

/// Writes bytes via a temp file and rename, so racing workers capturing
/// the same URL never expose a torn file at the final path.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "resource".to_string());
    let tmp = path.with_file_name(format!(
        "{file_name}.{}-{}.tmp",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn capture_set() -> HashSet<ResourceClass> {
        HashSet::from([
            ResourceClass::Image,
            ResourceClass::Stylesheet,
            ResourceClass::Script,
            ResourceClass::Font,
        ])
    }

    fn interceptor(out: &Path, store: Arc<ResourceStore>) -> ResourceInterceptor {
        ResourceInterceptor::new(
            build_http_client().unwrap(),
            PathMapper::new(out, "kinsu.mx"),
            store,
            capture_set(),
        )
    }

    #[tokio::test]
    async fn test_captured_resource_is_fulfilled_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/css/main.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("body { color: red }", "text/css"),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = Arc::new(ResourceStore::new());
        let interceptor = interceptor(dir.path(), Arc::clone(&store));

        let decision = interceptor
            .on_request(ResourceRequest {
                url: format!("{}/static/css/main.css", server.uri()),
                declared: ResourceClass::Stylesheet,
            })
            .await;

        match decision {
            InterceptDecision::Fulfill(response) => {
                assert_eq!(response.status, 200);
                assert_eq!(response.body, b"body { color: red }");
                assert!(response
                    .headers
                    .iter()
                    .any(|(k, v)| k == "content-type" && v == "text/css"));
            }
            InterceptDecision::Continue => panic!("expected fulfill"),
        }

        let saved = dir
            .path()
            .join("kinsu.mx")
            .join("static")
            .join("css")
            .join("main.css");
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "body { color: red }");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_document_request_passes_through() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ResourceStore::new());
        let interceptor = interceptor(dir.path(), Arc::clone(&store));

        let decision = interceptor
            .on_request(ResourceRequest {
                url: "https://kinsu.mx/".to_string(),
                declared: ResourceClass::Document,
            })
            .await;

        assert!(matches!(decision, InterceptDecision::Continue));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_passthrough() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ResourceStore::new());
        let interceptor = interceptor(dir.path(), Arc::clone(&store));

        // Nothing listens on this port, so the capture fetch fails fast
        let decision = interceptor
            .on_request(ResourceRequest {
                url: "http://127.0.0.1:1/app.js".to_string(),
                declared: ResourceClass::Script,
            })
            .await;

        assert!(matches!(decision, InterceptDecision::Continue));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_second_request_served_from_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/font.woff2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"fontbytes".to_vec())
                    .insert_header("content-type", "font/woff2"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = Arc::new(ResourceStore::new());
        let interceptor = interceptor(dir.path(), Arc::clone(&store));

        let request = ResourceRequest {
            url: format!("{}/font.woff2", server.uri()),
            declared: ResourceClass::Font,
        };

        // Two pages reference the same asset: only one network fetch
        for _ in 0..2 {
            let decision = interceptor.on_request(request.clone()).await;
            match decision {
                InterceptDecision::Fulfill(response) => {
                    assert_eq!(response.body, b"fontbytes");
                }
                InterceptDecision::Continue => panic!("expected fulfill"),
            }
        }

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_write_atomic_overwrites_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("asset.css");
        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
    }
}
