//! Headless Chromium renderer
//!
//! Drives a real browser over the Chrome DevTools Protocol. Every `render`
//! call opens a fresh tab, pauses outbound requests through the Fetch
//! domain, and forwards each one to the interception hook: a `Fulfill`
//! decision completes the request with the captured bytes, `Continue` lets
//! the browser hit the network itself.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FulfillRequestParams, HeaderEntry,
    RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use url::Url;

use crate::mirror::ResourceClass;
use crate::render::{
    extract_hrefs, InterceptDecision, InterceptHandler, PageRenderer, RenderedPage,
    ResourceRequest,
};
use crate::{EspejoError, Result};

/// Renderer backed by a headless Chromium instance
pub struct ChromiumRenderer {
    browser: Browser,
    handler_task: JoinHandle<()>,
    idle_wait: Duration,
}

impl ChromiumRenderer {
    /// Launches a headless browser
    ///
    /// # Arguments
    ///
    /// * `idle_wait` - The network quiescence window: rendering is
    ///   considered settled once no request has been observed for this long
    pub async fn launch(idle_wait: Duration) -> Result<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(EspejoError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_err)?;

        // The handler stream must be polled for the browser connection to
        // make progress at all.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            idle_wait,
        })
    }

    /// Closes the browser process and stops the connection handler
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Error closing browser: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &Url,
        interceptor: Arc<dyn InterceptHandler>,
        timeout: Duration,
    ) -> Result<RenderedPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_err)?;

        // Listener must exist before interception is enabled, otherwise
        // early requests pause with nobody to resume them.
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(browser_err)?;

        page.execute(EnableParams {
            patterns: Some(vec![RequestPattern {
                url_pattern: Some("*".to_string()),
                resource_type: None,
                request_stage: Some(RequestStage::Request),
            }]),
            handle_auth_requests: None,
        })
        .await
        .map_err(browser_err)?;

        let last_activity = Arc::new(Mutex::new(Instant::now()));

        let intercept_page = page.clone();
        let activity = Arc::clone(&last_activity);
        let intercept_task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                *activity.lock().unwrap() = Instant::now();

                let request = ResourceRequest {
                    url: event.request.url.clone(),
                    declared: class_of(&event.resource_type),
                };
                let request_id = event.request_id.clone();

                match interceptor.on_request(request).await {
                    InterceptDecision::Fulfill(response) => {
                        let headers: Vec<HeaderEntry> = response
                            .headers
                            .iter()
                            .map(|(name, value)| HeaderEntry {
                                name: name.clone(),
                                value: value.clone(),
                            })
                            .collect();

                        let fulfill = FulfillRequestParams::builder()
                            .request_id(request_id.clone())
                            .response_code(i64::from(response.status))
                            .response_headers(headers)
                            .body(BASE64.encode(&response.body))
                            .build();

                        let fulfilled = match fulfill {
                            Ok(params) => intercept_page.execute(params).await.is_ok(),
                            Err(_) => false,
                        };

                        if !fulfilled {
                            tracing::debug!(
                                "Fulfill failed for {}, passing request through",
                                event.request.url
                            );
                            let _ = intercept_page
                                .execute(ContinueRequestParams::new(request_id))
                                .await;
                        }
                    }
                    InterceptDecision::Continue => {
                        let _ = intercept_page
                            .execute(ContinueRequestParams::new(request_id))
                            .await;
                    }
                }
            }
        });

        // Navigate with a bounded timeout
        let navigation = async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Err(_) => {
                teardown(page, intercept_task).await;
                return Err(EspejoError::NavigationTimeout {
                    url: url.to_string(),
                });
            }
            Ok(Err(e)) => {
                teardown(page, intercept_task).await;
                return Err(EspejoError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
            Ok(Ok(())) => {}
        }

        // Wait for network quiescence: a client-side-routed page keeps
        // requesting chunks after the navigation itself completes.
        let idle_deadline = Instant::now() + timeout;
        loop {
            let quiet_for = last_activity.lock().unwrap().elapsed();
            if quiet_for >= self.idle_wait || Instant::now() >= idle_deadline {
                break;
            }
            tokio::time::sleep(self.idle_wait - quiet_for).await;
        }

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                teardown(page, intercept_task).await;
                return Err(EspejoError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        teardown(page, intercept_task).await;

        let links = extract_hrefs(&html);
        Ok(RenderedPage { html, links })
    }
}

/// Stops the interception listener and closes the tab
async fn teardown(page: Page, intercept_task: JoinHandle<()>) {
    intercept_task.abort();
    if let Err(e) = page.close().await {
        tracing::trace!("Error closing page: {}", e);
    }
}

fn browser_err(e: CdpError) -> EspejoError {
    EspejoError::Browser(e.to_string())
}

/// Maps a DevTools resource type onto the mirror's resource classes
fn class_of(resource_type: &ResourceType) -> ResourceClass {
    match resource_type {
        ResourceType::Document => ResourceClass::Document,
        ResourceType::Stylesheet => ResourceClass::Stylesheet,
        ResourceType::Script => ResourceClass::Script,
        ResourceType::Image => ResourceClass::Image,
        ResourceType::Font => ResourceClass::Font,
        ResourceType::Media => ResourceClass::Media,
        ResourceType::Xhr => ResourceClass::Xhr,
        ResourceType::Fetch => ResourceClass::Fetch,
        _ => ResourceClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_of_maps_capture_relevant_types() {
        assert_eq!(
            class_of(&ResourceType::Stylesheet),
            ResourceClass::Stylesheet
        );
        assert_eq!(class_of(&ResourceType::Font), ResourceClass::Font);
        assert_eq!(class_of(&ResourceType::Document), ResourceClass::Document);
        assert_eq!(class_of(&ResourceType::Ping), ResourceClass::Other);
    }
}
