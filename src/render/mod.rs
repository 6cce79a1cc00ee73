//! Page renderer contract
//!
//! Rendering is delegated to an external browser engine. This module pins
//! down the contract the crawl needs from it: navigate with a bounded
//! timeout, wait for network quiescence, hand back the rendered markup and
//! its anchors, and call the interception hook for every outbound
//! sub-resource request, honoring a substitute response when one is
//! supplied.

mod chromium;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::mirror::ResourceClass;
use crate::Result;

pub use chromium::ChromiumRenderer;

/// A sub-resource request observed while a page renders
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    /// The requested URL
    pub url: String,

    /// The resource class declared by the rendering engine
    pub declared: ResourceClass,
}

/// A response supplied back to the renderer in place of its own fetch
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Decision returned by the interception hook for a single request
#[derive(Debug)]
pub enum InterceptDecision {
    /// Complete the request with these bytes so the renderer never touches
    /// the network for it
    Fulfill(FetchedResponse),

    /// Let the renderer perform its own unmodified network fetch
    Continue,
}

/// Hook invoked for every outbound sub-resource request during a page load
#[async_trait]
pub trait InterceptHandler: Send + Sync {
    async fn on_request(&self, request: ResourceRequest) -> InterceptDecision;
}

/// The output of rendering one page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Full rendered markup
    pub html: String,

    /// Raw href values of every anchor element in the rendered DOM
    pub links: Vec<String>,
}

/// A browser engine capable of rendering a URL to a stable DOM
///
/// Each `render` call owns one full page load: interception is attached
/// before navigation begins and stays active until the markup has been
/// captured, so asynchronously requested resources are still observed.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        url: &Url,
        interceptor: Arc<dyn InterceptHandler>,
        timeout: Duration,
    ) -> Result<RenderedPage>;
}

/// Extracts the href of every anchor element in rendered markup
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                links.push(href.to_string());
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hrefs() {
        let html = r##"<html><body>
            <a href="/faq/">FAQ</a>
            <a href="https://kinsu.mx/about#team">Equipo</a>
            <a>sin href</a>
        </body></html>"##;

        let links = extract_hrefs(html);
        assert_eq!(links, vec!["/faq/", "https://kinsu.mx/about#team"]);
    }

    #[test]
    fn test_extract_hrefs_empty_document() {
        assert!(extract_hrefs("<html></html>").is_empty());
    }
}
