//! SERP fetching via the DuckDuckGo HTML endpoint.
//!
//! Research starts from the organic top results for a keyword. We query the
//! JS-free HTML frontend (`https://html.duckduckgo.com/html/?q=...`), parse
//! the anchors, unwrap redirect links, drop tracking/tag/feed URLs, and dedup
//! by host + path before capping the list.

mod parser;

use reqwest::Client;
use serpforge_shared::{Result, SerpforgeError, types::SerpItem};
use tracing::{info, instrument};

pub use parser::parse_serp_html;

/// User-Agent string for SERP requests.
const USER_AGENT: &str = concat!("serpforge/", env!("CARGO_PKG_VERSION"));

/// Accept-Language sent with every SERP request; the research corpus is
/// Russian-first.
const ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9,en;q=0.8";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for a SERP fetch.
#[derive(Debug, Clone)]
pub struct SerpOptions {
    /// Endpoint the query is appended to as `?q=`.
    pub endpoint: String,
    /// Maximum number of results to keep after filtering.
    pub max_results: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SerpOptions {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".into(),
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch and parse the organic SERP for a keyword.
///
/// Returns at most `opts.max_results` deduplicated items with contiguous
/// ranks. An empty result list is not an error; callers decide how to degrade.
#[instrument(skip_all, fields(keyword = %keyword))]
pub async fn fetch_serp(keyword: &str, opts: &SerpOptions) -> Result<Vec<SerpItem>> {
    let client = build_client(opts)?;
    let url = format!(
        "{}?q={}",
        opts.endpoint.trim_end_matches('?'),
        urlencode(keyword)
    );

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| SerpforgeError::from_reqwest(&url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SerpforgeError::BadResponse {
            url,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| SerpforgeError::Network(format!("{url}: failed to read body: {e}")))?;

    let items = parser::parse_serp_html(&body, opts.max_results);
    info!(count = items.len(), "SERP parsed");
    Ok(items)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with SERP request settings.
fn build_client(opts: &SerpOptions) -> Result<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static(ACCEPT_LANGUAGE),
    );

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| SerpforgeError::Network(format!("failed to build HTTP client: {e}")))
}

/// Percent-encode a query string the way `application/x-www-form-urlencoded`
/// does (spaces become `+`).
fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
