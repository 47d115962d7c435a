//! Web kit: search, extraction, crawling and site mapping through Tavily.
//!
//! Requests use the blocking `reqwest` client. Registry invocations from
//! async transports already run on the blocking pool, so the client is
//! created per call and never outlives the worker thread.

use std::time::Duration;

use anyhow::{Context, bail};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::domains::tools::{Kit, KitError, KitRegistrar};

const TAVILY_API_URL: &str = "https://api.tavily.com";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Hard limits so a caller can't start an unbounded crawl.
const CRAWL_MAX_DEPTH: u32 = 5;
const MAP_MAX_DEPTH: u32 = 3;
const MAP_MAX_BREADTH: u32 = 5;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// Search query.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UrlParams {
    /// Absolute URL, e.g. "https://example.com".
    pub url: String,
}

// ============================================================================
// Client
// ============================================================================

/// Minimal Tavily API client.
#[derive(Clone)]
pub struct TavilyClient {
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: TAVILY_API_URL.to_string(),
        }
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn search(&self, query: &str) -> anyhow::Result<Value> {
        self.post("search", search_body(query))
            .context("Tavily search failed")
    }

    pub fn extract(&self, url: &str) -> anyhow::Result<Value> {
        self.post("extract", extract_body(url))
            .context("Tavily extract failed")
    }

    pub fn crawl(&self, url: &str) -> anyhow::Result<Value> {
        self.post("crawl", crawl_body(url))
            .context("Tavily crawl failed")
    }

    pub fn map(&self, url: &str) -> anyhow::Result<Value> {
        self.post("map", map_body(url)).context("Tavily map failed")
    }

    #[instrument(skip(self, body))]
    fn post(&self, endpoint: &str, body: Value) -> anyhow::Result<Value> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        let url = format!("{}/{}", self.base_url, endpoint);
        let response = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("request timed out")
                } else if e.is_connect() {
                    anyhow::anyhow!("connection failed")
                } else {
                    anyhow::Error::new(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            bail!("API key rejected ({status})");
        }
        if status.as_u16() == 429 {
            bail!("rate limit exceeded");
        }
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            bail!("server answered {status}: {detail}");
        }

        let value: Value = response.json().context("invalid JSON in response")?;
        debug!("Tavily {} answered {}", endpoint, status);
        Ok(value)
    }
}

fn search_body(query: &str) -> Value {
    json!({ "query": query })
}

fn extract_body(url: &str) -> Value {
    json!({ "urls": [url] })
}

fn crawl_body(url: &str) -> Value {
    json!({ "url": url, "max_depth": CRAWL_MAX_DEPTH })
}

fn map_body(url: &str) -> Value {
    json!({ "url": url, "max_depth": MAP_MAX_DEPTH, "max_breadth": MAP_MAX_BREADTH })
}

// ============================================================================
// Kit
// ============================================================================

/// The web kit. Unavailable without an API key.
#[derive(Debug, Clone)]
pub struct WebKit {
    client: Option<TavilyClient>,
}

impl WebKit {
    pub const NAME: &'static str = "web";

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: api_key
                .filter(|key| !key.trim().is_empty())
                .map(TavilyClient::new),
        }
    }

    pub fn with_client(client: TavilyClient) -> Self {
        Self {
            client: Some(client),
        }
    }
}

impl Kit for WebKit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, registrar: &mut KitRegistrar<'_>) -> Result<(), KitError> {
        let Some(client) = &self.client else {
            return Err(KitError::unavailable(
                Self::NAME,
                "no Tavily API key configured (set TAVILY_API_KEY)",
            ));
        };

        let c = client.clone();
        registrar.register_typed(
            "web_search",
            "Search the web and return ranked results with snippets.",
            move |p: QueryParams| c.search(&p.query),
        )?;
        let c = client.clone();
        registrar.register_typed(
            "extract_page_content",
            "Extract the readable content of a single web page.",
            move |p: UrlParams| c.extract(&p.url),
        )?;
        let c = client.clone();
        registrar.register_typed(
            "web_crawl",
            "Crawl multiple pages starting from a single URL.",
            move |p: UrlParams| c.crawl(&p.url),
        )?;
        let c = client.clone();
        registrar.register_typed(
            "web_map",
            "Map the structure of a site: the pages reachable from a URL and how they link.",
            move |p: UrlParams| c.map(&p.url),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::{KitLoader, ToolError};

    #[test]
    fn test_request_bodies() {
        assert_eq!(search_body("rust"), json!({"query": "rust"}));
        assert_eq!(
            extract_body("https://a.dev"),
            json!({"urls": ["https://a.dev"]})
        );
        assert_eq!(
            crawl_body("https://a.dev"),
            json!({"url": "https://a.dev", "max_depth": 5})
        );
        assert_eq!(
            map_body("https://a.dev"),
            json!({"url": "https://a.dev", "max_depth": 3, "max_breadth": 5})
        );
    }

    #[test]
    fn test_missing_key_makes_kit_unavailable() {
        let (registry, report) = KitLoader::default()
            .load(vec![Box::new(WebKit::new(Some("  ".into())))])
            .unwrap();

        assert!(registry.is_empty());
        assert_eq!(report.skipped[0].name, "web");
        assert!(report.skipped[0].reason.contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_registers_tools() {
        let (registry, _) = KitLoader::default()
            .load(vec![Box::new(WebKit::new(Some("tvly-test".into())))])
            .unwrap();

        assert_eq!(
            registry.names(),
            vec!["web_search", "extract_page_content", "web_crawl", "web_map"]
        );
        let search = registry.get("web_search").unwrap();
        assert_eq!(search.parameters()[0].name, "query");
    }

    #[test]
    fn test_unreachable_api_is_execution_failure() {
        let client = TavilyClient::new("tvly-test").with_base_url("http://127.0.0.1:9/");
        let (registry, _) = KitLoader::default()
            .load(vec![Box::new(WebKit::with_client(client))])
            .unwrap();

        let args = json!({"query": "rust"}).as_object().cloned().unwrap();
        let err = registry.invoke("web_search", args).unwrap_err();
        assert!(
            matches!(err, ToolError::ExecutionFailed(ref m) if m.contains("Tavily search failed"))
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let client = TavilyClient::new("tvly-secret");
        assert!(!format!("{client:?}").contains("tvly-secret"));
    }
}
