//! Per-keyword research pipeline: SERP → page artifacts → corpus synthesis →
//! evidence → E-E-A-T → blueprint.
//!
//! The pipeline never aborts on an unreachable page; the extract layer
//! substitutes a synthetic artifact and downstream synthesis discounts it.

use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use serpforge_assistant::{AssistantClient, Provenance, SearchResult};
use serpforge_extract::FetchOptions;
use serpforge_serp::SerpOptions;
use serpforge_shared::config::AppConfig;
use serpforge_shared::rules::RuleSet;
use serpforge_shared::types::{
    RESEARCH_SCHEMA_VERSION, ResearchRecord, SerpItem,
};
use serpforge_shared::Result;

/// Fetch policies for one pipeline run, resolved from config once.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub serp: SerpOptions,
    pub fetch: FetchOptions,
}

impl PipelineOptions {
    /// Resolve options from the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            serp: SerpOptions {
                endpoint: config.fetch.serp_endpoint.clone(),
                max_results: config.defaults.serp_results as usize,
                timeout_secs: config.fetch.timeout_secs,
            },
            fetch: FetchOptions {
                timeout_secs: config.fetch.timeout_secs,
                retries: config.fetch.retries,
                backoff_ms: config.fetch.backoff_ms,
            },
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            serp: SerpOptions::default(),
            fetch: FetchOptions::default(),
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a SERP page is fetched.
    fn page_fetched(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, record: &ResearchRecord);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _record: &ResearchRecord) {}
}

/// Run the full research pipeline for one keyword.
///
/// When `assistant` is given, the SERP step routes through the gateway and
/// the record's `serp_source` says whether the answer came from the remote
/// service or its local fallback; otherwise the organic SERP is fetched
/// directly.
#[instrument(skip_all, fields(keyword = %keyword))]
pub async fn research_keyword(
    keyword: &str,
    opts: &PipelineOptions,
    rules: &RuleSet,
    assistant: Option<&AssistantClient>,
    progress: &dyn ProgressReporter,
) -> Result<ResearchRecord> {
    let start = Instant::now();

    // --- Phase 1: SERP ---
    progress.phase("Fetching SERP");
    let (serp, serp_source) = match assistant {
        Some(client) => {
            let assisted = client
                .search_internet(keyword, opts.serp.max_results)
                .await;
            let source = match assisted.provenance {
                Provenance::Remote => "assistant",
                Provenance::Fallback => "assistant-fallback",
            };
            (search_results_to_serp(&assisted.data), source)
        }
        None => (serpforge_serp::fetch_serp(keyword, &opts.serp).await?, "serp"),
    };

    if serp.is_empty() {
        warn!("SERP returned no results, continuing with an empty corpus");
    }

    // --- Phase 2: Page artifacts ---
    progress.phase("Extracting page artifacts");
    let client = serpforge_extract::build_client(&opts.fetch)?;
    let mut pages = Vec::with_capacity(serp.len());
    let total = serp.len();

    for (i, item) in serp.iter().enumerate() {
        progress.page_fetched(&item.url, i + 1, total);
        let artifact =
            serpforge_extract::fetch_artifact(&client, &item.url, &opts.fetch, rules).await?;
        pages.push(artifact);
    }

    // --- Phase 3: Synthesis ---
    progress.phase("Synthesizing corpus");
    let corpus = serpforge_synthesis::synthesize_corpus(&pages, rules);
    let evidence = serpforge_synthesis::evidence_pack(&pages);
    let eeat_checks = pages.iter().map(serpforge_synthesis::eeat_check).collect();

    // --- Phase 4: Blueprint ---
    progress.phase("Building blueprint");
    let blueprint = serpforge_blueprint::build_blueprint_now(keyword, &corpus);

    let record = ResearchRecord {
        id: Uuid::now_v7().to_string(),
        schema_version: RESEARCH_SCHEMA_VERSION,
        keyword: keyword.to_string(),
        research_name: format!("Исследование: {keyword}"),
        serp,
        pages,
        corpus,
        blueprint,
        evidence,
        eeat_checks,
        serp_source: serp_source.to_string(),
        created_at: chrono::Utc::now(),
        execution_time_seconds: start.elapsed().as_secs_f64(),
        status: "completed".to_string(),
    };

    progress.done(&record);
    info!(
        research_id = %record.id,
        pages = record.pages.len(),
        facts = record.corpus.consensus.len(),
        serp_source = %record.serp_source,
        elapsed_ms = start.elapsed().as_millis(),
        "research pipeline complete"
    );

    Ok(record)
}

/// Map gateway search results onto SERP items. Ranks are renumbered to stay
/// contiguous regardless of what the service answered.
fn search_results_to_serp(results: &[SearchResult]) -> Vec<SerpItem> {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| SerpItem {
            rank: (i + 1) as u32,
            url: r.url.clone(),
            title: r.title.clone(),
            publisher: (!r.domain.is_empty()).then(|| r.domain.clone()),
            snippet: (!r.snippet.is_empty()).then(|| r.snippet.clone()),
            publish_date: None,
            content_type: None,
            why_selected: None,
        })
        .collect()
}
