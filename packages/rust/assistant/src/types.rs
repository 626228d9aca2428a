//! Wire types for the AI assistant gateway.
//!
//! Every operation has a typed request body and a typed response; responses
//! are wrapped in [`Assisted`] so callers always know whether the data came
//! from the remote service or a local fallback.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Where an assistant answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// The remote assistant service answered.
    Remote,
    /// The service was unreachable or misbehaved; a local heuristic answered.
    Fallback,
}

/// An assistant answer together with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assisted<T> {
    pub data: T,
    pub provenance: Provenance,
}

impl<T> Assisted<T> {
    pub fn remote(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Remote,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            provenance: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub action: &'static str,
    pub query: String,
    pub num_results: usize,
    pub search_engines: Vec<String>,
    pub language: String,
}

impl SearchRequest {
    pub fn new(query: &str, num_results: usize) -> Self {
        Self {
            action: "web_search",
            query: query.to_string(),
            num_results,
            search_engines: vec!["google".into(), "yandex".into()],
            language: "ru".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One web-search hit from the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub domain: String,
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// Competitor analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub action: &'static str,
    pub keyword: String,
    pub search_results: Vec<SearchResult>,
    pub analysis_type: &'static str,
    pub extract: Vec<&'static str>,
}

impl AnalyzeRequest {
    pub fn new(keyword: &str, search_results: Vec<SearchResult>) -> Self {
        Self {
            action: "analyze_competitors",
            keyword: keyword.to_string(),
            search_results,
            analysis_type: "comprehensive",
            extract: vec![
                "structure",
                "content_themes",
                "lsi_keywords",
                "gaps",
                "recommendations",
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStructure {
    #[serde(default)]
    pub avg_length: u32,
    #[serde(default)]
    pub common_sections: Vec<String>,
    #[serde(default)]
    pub structure_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub keyword: String,
    #[serde(default)]
    pub competitors: Vec<SearchResult>,
    #[serde(default)]
    pub total_found: usize,
    #[serde(default)]
    pub common_themes: Vec<String>,
    #[serde(default)]
    pub content_structure: ContentStructure,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub lsi_keywords: Vec<String>,
    #[serde(default)]
    pub analysis_date: String,
    #[serde(default)]
    pub status: String,
}

// ---------------------------------------------------------------------------
// Article generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub action: &'static str,
    pub keyword: String,
    pub competitors_data: serde_json::Value,
    pub company_profile: serde_json::Value,
    pub target_words: u32,
    pub requirements: serde_json::Value,
    pub style: serde_json::Value,
}

impl GenerateRequest {
    pub fn new(
        keyword: &str,
        competitors_data: serde_json::Value,
        company_profile: serde_json::Value,
        target_words: u32,
    ) -> Self {
        Self {
            action: "generate_article",
            keyword: keyword.to_string(),
            competitors_data,
            company_profile,
            target_words,
            requirements: serde_json::json!({
                "unique_content": true,
                "seo_optimized": true,
                "include_faq": true,
                "include_cta": true,
                "company_branding": true,
                "structure_based_on_analysis": true,
            }),
            style: serde_json::json!({
                "tone": "professional",
                "language": "ru",
                "target_audience": "business_owners",
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub reading_time: u32,
    #[serde(default)]
    pub structure: Vec<String>,
    #[serde(default)]
    pub lsi_keywords_used: Vec<String>,
    #[serde(default)]
    pub generated_at: String,
}

// ---------------------------------------------------------------------------
// SEO optimization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SeoRequest {
    pub action: &'static str,
    pub content: String,
    pub keyword: String,
    pub requirements: serde_json::Value,
}

impl SeoRequest {
    pub fn new(content: &str, keyword: &str) -> Self {
        Self {
            action: "optimize_seo",
            content: content.to_string(),
            keyword: keyword.to_string(),
            requirements: serde_json::json!({
                "keyword_density": "0.6-0.8%",
                "meta_optimization": true,
                "heading_structure": true,
                "internal_linking": true,
                "readability": true,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaOptimization {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoOptimization {
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub keyword_density: f64,
    #[serde(default)]
    pub readability_score: f64,
    #[serde(default)]
    pub meta_optimization: MetaOptimization,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

// ---------------------------------------------------------------------------
// FAQ generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FaqRequest {
    pub action: &'static str,
    pub keyword: String,
    pub content: String,
    pub requirements: serde_json::Value,
}

impl FaqRequest {
    pub fn new(keyword: &str, content: &str) -> Self {
        Self {
            action: "generate_faq",
            keyword: keyword.to_string(),
            content: content.to_string(),
            requirements: serde_json::json!({
                "num_questions": 7,
                "json_ld_schema": true,
                "html_format": true,
                "relevant_to_content": true,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqBundle {
    pub questions: Vec<String>,
    #[serde(default)]
    pub json_ld: serde_json::Value,
    #[serde(default)]
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_wire_shape() {
        let req = SearchRequest::new("банковская гарантия", 5);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "web_search");
        assert_eq!(json["num_results"], 5);
        assert_eq!(json["language"], "ru");
        assert_eq!(json["search_engines"][1], "yandex");
    }

    #[test]
    fn assisted_provenance_roundtrip() {
        let assisted = Assisted::fallback(vec![1, 2, 3]);
        assert!(assisted.is_fallback());
        let json = serde_json::to_string(&assisted).unwrap();
        assert!(json.contains("\"fallback\""));
        let parsed: Assisted<Vec<u32>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.provenance, Provenance::Fallback);
    }

    #[test]
    fn analysis_tolerates_sparse_response() {
        let parsed: CompetitorAnalysis =
            serde_json::from_str(r#"{"keyword": "кв"}"#).unwrap();
        assert_eq!(parsed.keyword, "кв");
        assert!(parsed.competitors.is_empty());
        assert_eq!(parsed.content_structure.avg_length, 0);
    }
}
