//! AI assistant gateway.
//!
//! A thin HTTP client for the optional assistant service: web search,
//! competitor analysis, article generation, SEO optimization, and FAQ
//! generation. Every operation is gated on a health probe and degrades to a
//! local heuristic fallback on any failure, so callers always get an answer;
//! [`Assisted::provenance`] records which path produced it.

mod fallback;
pub mod types;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serpforge_shared::config::AssistantConfig;
use serpforge_shared::{Result, SerpforgeError};
use tracing::{debug, info, instrument, warn};

pub use types::{
    Assisted, CompetitorAnalysis, FaqBundle, GeneratedArticle, Provenance, SearchResult,
    SeoOptimization,
};

use types::{AnalyzeRequest, FaqRequest, GenerateRequest, SearchRequest, SearchResponse, SeoRequest};

/// User-Agent string for gateway requests.
const USER_AGENT: &str = concat!("serpforge/", env!("CARGO_PKG_VERSION"));

/// Per-operation timeouts, in seconds.
const HEALTH_TIMEOUT_SECS: u64 = 10;
const SEARCH_TIMEOUT_SECS: u64 = 30;
const ANALYZE_TIMEOUT_SECS: u64 = 60;
const GENERATE_TIMEOUT_SECS: u64 = 120;
const SEO_TIMEOUT_SECS: u64 = 60;
const FAQ_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the assistant service.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
}

impl AssistantClient {
    /// Build a client from config. The bearer token comes from the configured
    /// env var.
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key());
        let mut auth_value = reqwest::header::HeaderValue::from_str(&auth)
            .map_err(|e| SerpforgeError::Gateway(format!("invalid API key: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| SerpforgeError::Gateway(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe `GET /health`. Any non-200 answer or transport error counts as
    /// unavailable.
    pub async fn test_connection(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "assistant unavailable");
                false
            }
            Err(e) => {
                warn!(error = %e, "assistant unavailable");
                false
            }
        }
    }

    /// Web search through the assistant, falling back to templated results.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn search_internet(
        &self,
        query: &str,
        num_results: usize,
    ) -> Assisted<Vec<SearchResult>> {
        let request = SearchRequest::new(query, num_results);
        match self
            .post::<_, SearchResponse>("/search", &request, SEARCH_TIMEOUT_SECS)
            .await
        {
            Some(response) => {
                info!(count = response.results.len(), "assistant search succeeded");
                Assisted::remote(response.results)
            }
            None => Assisted::fallback(fallback::fallback_search(query, num_results)),
        }
    }

    /// Competitor analysis over a set of search results.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn analyze_competitors(
        &self,
        keyword: &str,
        search_results: &[SearchResult],
    ) -> Assisted<CompetitorAnalysis> {
        let request = AnalyzeRequest::new(keyword, search_results.to_vec());
        match self
            .post::<_, CompetitorAnalysis>("/analyze", &request, ANALYZE_TIMEOUT_SECS)
            .await
        {
            Some(analysis) => Assisted::remote(analysis),
            None => Assisted::fallback(fallback::fallback_analysis(keyword, search_results)),
        }
    }

    /// Article generation.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn generate_article(
        &self,
        keyword: &str,
        competitors_data: serde_json::Value,
        company_profile: serde_json::Value,
        target_words: u32,
    ) -> Assisted<GeneratedArticle> {
        let request = GenerateRequest::new(keyword, competitors_data, company_profile, target_words);
        match self
            .post::<_, GeneratedArticle>("/generate", &request, GENERATE_TIMEOUT_SECS)
            .await
        {
            Some(article) => Assisted::remote(article),
            None => Assisted::fallback(fallback::fallback_article(keyword)),
        }
    }

    /// SEO optimization of generated content.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn optimize_seo(&self, content: &str, keyword: &str) -> Assisted<SeoOptimization> {
        let request = SeoRequest::new(content, keyword);
        match self
            .post::<_, SeoOptimization>("/seo", &request, SEO_TIMEOUT_SECS)
            .await
        {
            Some(seo) => Assisted::remote(seo),
            None => Assisted::fallback(fallback::fallback_seo(content, keyword)),
        }
    }

    /// FAQ generation for an article.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn generate_faq(&self, keyword: &str, content: &str) -> Assisted<FaqBundle> {
        let request = FaqRequest::new(keyword, content);
        match self
            .post::<_, FaqBundle>("/faq", &request, FAQ_TIMEOUT_SECS)
            .await
        {
            Some(faq) => Assisted::remote(faq),
            None => Assisted::fallback(fallback::fallback_faq(keyword)),
        }
    }

    /// POST a typed request, gated on the health probe. `None` means "use the
    /// fallback": unavailable service, non-200 answer, or an undecodable
    /// body.
    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
        timeout_secs: u64,
    ) -> Option<Resp> {
        if !self.test_connection().await {
            debug!(path, "health probe failed, using fallback");
            return None;
        }

        let url = format!("{}{path}", self.base_url);
        let response = match self
            .client
            .post(&url)
            .timeout(Duration::from_secs(timeout_secs))
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, path, "assistant request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), path, "assistant answered with error");
            return None;
        }

        match response.json::<Resp>().await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(error = %e, path, "assistant answer undecodable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &wiremock::MockServer) -> AssistantConfig {
        AssistantConfig {
            base_url: server.uri(),
            api_key_env: "SERPFORGE_TEST_ASSISTANT_KEY".into(),
        }
    }

    async fn mount_health(server: &wiremock::MockServer, status: u16) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .respond_with(wiremock::ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_search_remote_path() {
        let server = wiremock::MockServer::start().await;
        mount_health(&server, 200).await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/search"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"action": "web_search", "language": "ru"}),
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "results": [
                        {"title": "Гарантия", "url": "https://a.ru/bg", "snippet": "s", "domain": "a.ru", "rank": 1}
                    ]
                }),
            ))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        let result = client.search_internet("банковская гарантия", 5).await;

        assert_eq!(result.provenance, Provenance::Remote);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].url, "https://a.ru/bg");
    }

    #[tokio::test]
    async fn test_search_falls_back_when_unhealthy() {
        let server = wiremock::MockServer::start().await;
        mount_health(&server, 503).await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        let result = client.search_internet("кв", 2).await;

        assert!(result.is_fallback());
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0].domain, "example1.com");
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_bad_status() {
        let server = wiremock::MockServer::start().await;
        mount_health(&server, 200).await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/analyze"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        let result = client.analyze_competitors("кв", &[]).await;

        assert!(result.is_fallback());
        assert_eq!(result.data.keyword, "кв");
        assert_eq!(result.data.content_structure.avg_length, 2500);
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_undecodable_body() {
        let server = wiremock::MockServer::start().await;
        mount_health(&server, 200).await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/generate"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("not json"),
            )
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        let result = client
            .generate_article(
                "банковская гарантия",
                serde_json::json!({}),
                serde_json::json!({}),
                2500,
            )
            .await;

        assert!(result.is_fallback());
        assert!(result.data.content.contains("банковская гарантия"));
    }

    #[tokio::test]
    async fn test_faq_remote_path() {
        let server = wiremock::MockServer::start().await;
        mount_health(&server, 200).await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/faq"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "questions": ["Что такое БГ?"],
                    "json_ld": {"@type": "FAQPage"},
                    "html": "<div></div>"
                }),
            ))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        let result = client.generate_faq("кв", "контент").await;

        assert_eq!(result.provenance, Provenance::Remote);
        assert_eq!(result.data.questions, vec!["Что такое БГ?"]);
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_auth() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/health"))
            .and(wiremock::matchers::header_exists("authorization"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssistantClient::new(&config_for(&server)).unwrap();
        assert!(client.test_connection().await);
    }
}
