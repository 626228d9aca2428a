//! Core domain types for the serpforge research pipeline.
//!
//! Everything that crosses a crate boundary or gets persisted lives here as
//! an explicit serde struct — persisted research records are structured JSON,
//! portable and inspectable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for persisted research records.
pub const RESEARCH_SCHEMA_VERSION: u32 = 1;

/// Reading time in minutes derived from a word count.
///
/// Invariant: `reading_time_min = max(1, word_count / 200)`.
pub fn reading_time_min(word_count: u32) -> u32 {
    (word_count / 200).max(1)
}

// ---------------------------------------------------------------------------
// GroupId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for task-group identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Generate a new time-sortable group identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GroupId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// SERP
// ---------------------------------------------------------------------------

/// One organic search result, ranked and deduplicated by `(host, path)`.
///
/// Created once per fetch, immutable, embedded into research records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpItem {
    /// 1-based rank by first-seen order.
    pub rank: u32,
    /// Resolved target URL (redirect wrappers unwrapped).
    pub url: String,
    /// Result title from the anchor text.
    pub title: String,
    /// Publisher, derived from the URL host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Result snippet, truncated to 300 chars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Publish date, when the engine exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<NaiveDate>,
    /// Content type tag (guide, FAQ, landing, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Why this result was selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_selected: Option<String>,
}

// ---------------------------------------------------------------------------
// PageArtifact
// ---------------------------------------------------------------------------

/// A question/answer pair extracted from disclosure markup or generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// A heuristically detected calculator form on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorForm {
    /// Form id, or "calculator" when anonymous.
    pub name: String,
    /// Label/input texts that triggered the detection.
    pub inputs: Vec<String>,
    /// Detection notes.
    pub notes: String,
}

/// Normalized structural extraction of one web page.
///
/// Immutable after creation. `synthetic` distinguishes a fallback artifact
/// (built from the URL host after fetch failure) from a real extraction;
/// synthetic artifacts are excluded from consensus computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageArtifact {
    pub url: String,
    pub title: String,
    /// Ordered outline of "H1: ..."/"H2: ..."/"H3: ..." entries.
    pub h_outline: Vec<String>,
    /// Concatenated paragraph/list-item text.
    pub content_plain: String,
    /// One TSV block per `<table>`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables_tsv: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculators: Vec<CalculatorForm>,
    /// Deduplicated legal citations, first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<NaiveDate>,
    /// schema.org `@type` values from embedded JSON-LD.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_types: Vec<String>,
    /// Call-to-action phrases found in anchor text, deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctas: Vec<String>,
    /// Always >= 1; equals `max(1, word_count / 200)`.
    pub reading_time_min: u32,
    pub word_count: u32,
    /// True when this artifact was fabricated after a fetch failure.
    #[serde(default)]
    pub synthetic: bool,
}

// ---------------------------------------------------------------------------
// CorpusSynthesis
// ---------------------------------------------------------------------------

/// A citing source for a consensus fact: URL plus a ~120-char quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSource {
    pub url: String,
    pub quote: String,
}

/// A numeric claim corroborated by at least two distinct source URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusFact {
    pub claim: String,
    /// Up to 4 supporting sources, >= 2 distinct URLs among them.
    pub sources: Vec<FactSource>,
}

/// A legal norm cited across the corpus, with the pages citing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalAnchor {
    pub norm: String,
    pub why: String,
    /// Up to 3 citing URLs.
    pub sources: Vec<String>,
}

/// Named entities aggregated across the corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    /// Distinct publishers, sorted.
    #[serde(rename = "ORG", default)]
    pub org: Vec<String>,
    /// Configured domain-term list.
    #[serde(rename = "TERMS", default)]
    pub terms: Vec<String>,
    /// Distinct legal references.
    #[serde(rename = "LEGAL", default)]
    pub legal: Vec<String>,
}

/// Cross-source synthesis of a keyword's artifact corpus.
///
/// Derived and recomputed each run, never mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusSynthesis {
    #[serde(default)]
    pub consensus: Vec<ConsensusFact>,
    #[serde(default)]
    pub disagreements: Vec<String>,
    #[serde(default)]
    pub legal_anchors: Vec<LegalAnchor>,
    /// Top-K most frequent H2 headings, "H2 <text>".
    #[serde(default)]
    pub common_outline: Vec<String>,
    #[serde(default)]
    pub must_have_blocks: Vec<String>,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub risk_compliance: Vec<String>,
    #[serde(default)]
    pub freshness: Vec<String>,
}

// ---------------------------------------------------------------------------
// SeoBlueprint
// ---------------------------------------------------------------------------

/// An internal-link suggestion in the blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalLink {
    pub anchor: String,
    pub target: String,
}

/// Constrained, deterministic content specification for a keyword.
///
/// A pure function of `(keyword, corpus, today)` — identical inputs yield
/// byte-identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoBlueprint {
    pub title: String,
    pub h1: String,
    /// Matches `^[a-z0-9-]{1,80}$`, never empty.
    pub slug: String,
    /// At most 160 chars.
    pub meta_description: String,
    pub outline: Vec<String>,
    pub blocks: Vec<String>,
    pub faq: Vec<FaqEntry>,
    pub internal_links: Vec<InternalLink>,
    pub eeat: Vec<String>,
    pub tech: Vec<String>,
    pub schema: Vec<String>,
}

// ---------------------------------------------------------------------------
// Evidence / E-E-A-T
// ---------------------------------------------------------------------------

/// A citable numeric fact found in at least two sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceFact {
    pub value: String,
    pub source_url: String,
    pub quote: String,
}

/// E-E-A-T signals checked on one page artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EeatCheck {
    pub url: String,
    pub has_author: bool,
    pub has_date: bool,
    pub has_legal_refs: bool,
    pub has_schema: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Lifecycle state of a queued research task.
///
/// Transitions are monotonic: pending → running → {completed, failed};
/// never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and failed states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted unit of research work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// `<group_id>_task_<ordinal>`.
    pub task_id: String,
    /// Owning group.
    pub group_id: String,
    pub keyword: String,
    pub priority: i64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_data: Option<String>,
}

/// Progress snapshot for a task group.
///
/// Invariant: `completed_tasks + failed_tasks <= total_tasks`, and the sum
/// equals the number of tasks in a terminal state at every observation point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatus {
    pub group_id: String,
    pub name: String,
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub failed_tasks: u32,
    pub status: String,
    pub progress_percent: f64,
}

// ---------------------------------------------------------------------------
// ResearchRecord
// ---------------------------------------------------------------------------

/// The persisted output of one keyword's pipeline run, consumed by the
/// downstream publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRecord {
    /// UUID v7, time-sortable.
    pub id: String,
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    pub keyword: String,
    pub research_name: String,
    pub serp: Vec<SerpItem>,
    pub pages: Vec<PageArtifact>,
    pub corpus: CorpusSynthesis,
    pub blueprint: SeoBlueprint,
    pub evidence: Vec<EvidenceFact>,
    pub eeat_checks: Vec<EeatCheck>,
    /// Where the SERP step came from: "serp", "assistant", or
    /// "assistant-fallback".
    pub serp_source: String,
    pub created_at: DateTime<Utc>,
    pub execution_time_seconds: f64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_id_roundtrip() {
        let id = GroupId::new();
        let s = id.to_string();
        let parsed: GroupId = s.parse().expect("parse GroupId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn reading_time_floor_is_one() {
        assert_eq!(reading_time_min(0), 1);
        assert_eq!(reading_time_min(85), 1);
        assert_eq!(reading_time_min(200), 1);
        assert_eq!(reading_time_min(401), 2);
        assert_eq!(reading_time_min(1000), 5);
    }

    #[test]
    fn task_status_roundtrip_and_terminality() {
        for s in ["pending", "running", "completed", "failed"] {
            let parsed: TaskStatus = s.parse().expect("parse status");
            assert_eq!(parsed.as_str(), s);
        }
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn entities_serialize_with_upper_keys() {
        let entities = Entities {
            org: vec!["bank.example".into()],
            terms: vec!["независимая гарантия".into()],
            legal: vec!["44-ФЗ".into()],
        };
        let json = serde_json::to_value(&entities).expect("serialize");
        assert!(json.get("ORG").is_some());
        assert!(json.get("TERMS").is_some());
        assert!(json.get("LEGAL").is_some());
    }

    #[test]
    fn artifact_serialization_roundtrip() {
        let artifact = PageArtifact {
            url: "https://bank.example/garantiya".into(),
            title: "Банковская гарантия".into(),
            h_outline: vec!["H1: Банковская гарантия".into(), "H2: Сроки".into()],
            content_plain: "Срок выпуска от 1 дня.".into(),
            tables_tsv: vec![],
            faq: vec![FaqEntry {
                question: "Как быстро?".into(),
                answer: "От 1 дня.".into(),
            }],
            calculators: vec![],
            legal_refs: vec!["44-ФЗ".into()],
            author: None,
            publisher: Some("bank.example".into()),
            publish_date: None,
            update_date: None,
            schema_types: vec!["Article".into()],
            ctas: vec![],
            reading_time_min: 1,
            word_count: 5,
            synthetic: false,
        };

        let json = serde_json::to_string(&artifact).expect("serialize");
        let parsed: PageArtifact = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.title, "Банковская гарантия");
        assert_eq!(parsed.faq.len(), 1);
        assert!(!parsed.synthetic);
    }

    #[test]
    fn synthetic_defaults_to_false_for_older_records() {
        // Records persisted before the provenance field existed.
        let json = r#"{
            "url": "https://a.example/x",
            "title": "t",
            "h_outline": [],
            "content_plain": "",
            "reading_time_min": 1,
            "word_count": 0
        }"#;
        let parsed: PageArtifact = serde_json::from_str(json).expect("deserialize");
        assert!(!parsed.synthetic);
    }
}
