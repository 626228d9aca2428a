//! Page fetching and structural extraction.
//!
//! Each SERP result is fetched with a bounded retry policy and distilled into
//! a [`PageArtifact`]: heading outline, tables, FAQ, calculator forms, legal
//! citations, authorship signals, CTAs, and JSON-LD types. Unreachable pages
//! degrade into a marked synthetic artifact instead of failing the pipeline.

mod extractor;
mod synthetic;

use reqwest::Client;
use serpforge_shared::rules::RuleSet;
use serpforge_shared::types::PageArtifact;
use serpforge_shared::{Result, SerpforgeError};
use tracing::{instrument, warn};

pub use extractor::{domain_of, extract_artifact, normalize_date_str};
pub use synthetic::synthetic_artifact;

/// User-Agent string for page fetches.
const USER_AGENT: &str = concat!("serpforge/", env!("CARGO_PKG_VERSION"));

/// Accept-Language sent with every page fetch.
const ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9,en;q=0.8";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Retry and timeout policy for page fetches.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Fixed delay between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retries: 2,
            backoff_ms: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Build the shared HTTP client for page fetches.
pub fn build_client(opts: &FetchOptions) -> Result<Client> {
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

/// GET a URL with fixed-interval retries.
///
/// Retries on connection errors, timeouts, and non-2xx statuses alike; the
/// last error is returned once attempts are exhausted.
pub async fn http_get(client: &Client, url: &str, opts: &FetchOptions) -> Result<String> {
    let mut last_err = SerpforgeError::Network(format!("{url}: no attempts made"));

    for attempt in 0..=opts.retries {
        if attempt > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(opts.backoff_ms)).await;
        }

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response.text().await.map_err(|e| {
                        SerpforgeError::Network(format!("{url}: failed to read body: {e}"))
                    });
                }
                last_err = SerpforgeError::BadResponse {
                    url: url.to_string(),
                    status: status.as_u16(),
                };
            }
            Err(e) => {
                last_err = SerpforgeError::from_reqwest(url, &e);
            }
        }
    }

    Err(last_err)
}

/// Fetch a page and extract its artifact, degrading to a synthetic artifact
/// on fetch failure.
///
/// Only fetch-level failures (network, timeout, bad status) trigger the
/// fallback; anything else propagates.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_artifact(
    client: &Client,
    url: &str,
    opts: &FetchOptions,
    rules: &RuleSet,
) -> Result<PageArtifact> {
    match http_get(client, url, opts).await {
        Ok(html) => Ok(extract_artifact(&html, url, url, rules)),
        Err(e) if e.is_fetch_failure() => {
            warn!(error = %e, "page unreachable, substituting synthetic artifact");
            Ok(synthetic_artifact(url))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_opts() -> FetchOptions {
        FetchOptions {
            timeout_secs: 5,
            retries: 2,
            backoff_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_fetch_artifact_extracts_real_page() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/bg"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                "<html><head><title>t</title></head>\
                 <body><h1>Банковская гарантия за 1 день</h1>\
                 <p>По 44-ФЗ срок выпуска от одного дня.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let opts = fast_opts();
        let client = build_client(&opts).unwrap();
        let url = format!("{}/bg", server.uri());
        let art = fetch_artifact(&client, &url, &opts, &RuleSet::default())
            .await
            .unwrap();

        assert!(!art.synthetic);
        assert_eq!(art.title, "Банковская гарантия за 1 день");
        assert_eq!(art.legal_refs, vec!["44-ФЗ"]);
    }

    #[tokio::test]
    async fn test_http_get_retries_then_succeeds() {
        let server = wiremock::MockServer::start().await;

        // Two failures, then success: exactly within the retry budget.
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let opts = fast_opts();
        let client = build_client(&opts).unwrap();
        let body = http_get(&client, &server.uri(), &opts).await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_http_get_exhausts_retries() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .expect(3) // initial attempt + 2 retries
            .mount(&server)
            .await;

        let opts = fast_opts();
        let client = build_client(&opts).unwrap();
        let err = http_get(&client, &server.uri(), &opts).await.unwrap_err();
        assert!(matches!(err, SerpforgeError::BadResponse { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_artifact_falls_back_to_synthetic() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let opts = fast_opts();
        let client = build_client(&opts).unwrap();
        let url = format!("{}/gone", server.uri());
        let art = fetch_artifact(&client, &url, &opts, &RuleSet::default())
            .await
            .unwrap();

        assert!(art.synthetic);
        assert!(art.title.contains("банковские гарантии"));
    }
}
