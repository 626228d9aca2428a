//! Cross-source corpus synthesis.
//!
//! Given the page artifacts for a keyword, this crate derives the shared
//! heading structure, numeric consensus facts with citations, canned
//! disagreement statements, legal anchors, and aggregated entities. All of it
//! is a pure function of the input corpus; identical artifacts always yield
//! an identical synthesis.

mod evidence;

use regex::Regex;
use serpforge_shared::rules::RuleSet;
use serpforge_shared::types::{
    ConsensusFact, CorpusSynthesis, Entities, FactSource, LegalAnchor, PageArtifact,
};
use tracing::instrument;

pub use evidence::{eeat_check, evidence_pack};

/// Numeric indicator pattern: percentages (`3%`, `2,5 %`) and grouped
/// thousands (`500 000`).
pub(crate) const NUMERIC_PATTERN: &str = r"(\d+[.,]?\d*\s?%|\d{1,3}(?:\s?\d{3})+)";

/// How many H2 headings make it into the common outline.
const COMMON_OUTLINE_LIMIT: usize = 8;

/// A consensus fact cites at most this many sources.
const CONSENSUS_SOURCE_LIMIT: usize = 4;

/// A legal anchor cites at most this many URLs.
const LEGAL_ANCHOR_SOURCE_LIMIT: usize = 3;

/// Characters of context kept on each side of a numeric match.
const QUOTE_CONTEXT_CHARS: usize = 80;

/// Quote length cap in characters.
const QUOTE_MAX_CHARS: usize = 120;

/// Synthesize the corpus of page artifacts for one keyword.
///
/// Synthetic artifacts participate in outline frequency, disagreements, and
/// legal anchors, but never in numeric consensus: a fabricated fallback page
/// must not corroborate a number.
#[instrument(skip_all, fields(pages = pages.len()))]
pub fn synthesize_corpus(pages: &[PageArtifact], rules: &RuleSet) -> CorpusSynthesis {
    let legal_pool = legal_pool(pages);

    let mut org: Vec<String> = pages
        .iter()
        .filter_map(|p| p.publisher.clone())
        .collect();
    org.sort();
    org.dedup();

    CorpusSynthesis {
        consensus: numeric_consensus(pages),
        disagreements: disagreements(pages, rules),
        legal_anchors: legal_anchors(pages, &legal_pool),
        common_outline: common_outline(pages),
        must_have_blocks: rules.must_have_blocks.clone(),
        entities: Entities {
            org,
            terms: rules.domain_terms.clone(),
            legal: legal_pool,
        },
        risk_compliance: rules.risk_compliance.clone(),
        freshness: rules.freshness.clone(),
    }
}

// ---------------------------------------------------------------------------
// Outline
// ---------------------------------------------------------------------------

/// Top-K most frequent H2 headings across the corpus, formatted `"H2 <text>"`.
/// Ties break by first appearance.
fn common_outline(pages: &[PageArtifact]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for page in pages {
        for heading in &page.h_outline {
            if let Some(text) = heading.strip_prefix("H2: ") {
                match counts.iter_mut().find(|(h, _)| h == text) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((text.to_string(), 1)),
                }
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(COMMON_OUTLINE_LIMIT)
        .map(|(h, _)| format!("H2 {h}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Numeric consensus
// ---------------------------------------------------------------------------

/// Numeric values corroborated by at least two distinct source URLs.
fn numeric_consensus(pages: &[PageArtifact]) -> Vec<ConsensusFact> {
    let re = Regex::new(NUMERIC_PATTERN).expect("static pattern");

    // Vec keyed by value keeps first-seen ordering deterministic.
    let mut facts_map: Vec<(String, Vec<FactSource>)> = Vec::new();

    for page in pages.iter().filter(|p| !p.synthetic) {
        for m in re.find_iter(&page.content_plain) {
            let value = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
            let quote = truncate_chars(
                &window_around(&page.content_plain, m.start(), m.end(), QUOTE_CONTEXT_CHARS),
                QUOTE_MAX_CHARS,
            );
            let source = FactSource {
                url: page.url.clone(),
                quote,
            };
            match facts_map.iter_mut().find(|(v, _)| *v == value) {
                Some((_, sources)) => sources.push(source),
                None => facts_map.push((value, vec![source])),
            }
        }
    }

    facts_map
        .into_iter()
        .filter_map(|(value, sources)| {
            let mut urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
            urls.sort_unstable();
            urls.dedup();
            (urls.len() >= 2).then(|| ConsensusFact {
                claim: format!("Повторяющийся числовой индикатор: {value}"),
                sources: sources.into_iter().take(CONSENSUS_SOURCE_LIMIT).collect(),
            })
        })
        .collect()
}

/// Context window around a byte range, measured in characters on each side.
/// Regex match offsets always fall on char boundaries.
fn window_around(text: &str, start: usize, end: usize, pad: usize) -> String {
    let before: String = text[..start]
        .chars()
        .rev()
        .take(pad)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: String = text[end..].chars().take(pad).collect();
    format!("{before}{}{after}", &text[start..end])
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Disagreements and legal anchors
// ---------------------------------------------------------------------------

/// Evaluate the configured disagreement rules over the combined lowercased
/// corpus text.
fn disagreements(pages: &[PageArtifact], rules: &RuleSet) -> Vec<String> {
    let all_text = pages
        .iter()
        .map(|p| p.content_plain.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    rules
        .disagreement_rules
        .iter()
        .filter(|rule| {
            if rule.match_all {
                rule.needles.iter().all(|n| all_text.contains(n.as_str()))
            } else {
                rule.needles.iter().any(|n| all_text.contains(n.as_str()))
            }
        })
        .map(|rule| rule.statement.clone())
        .collect()
}

/// Distinct legal references across the corpus, first-seen order.
fn legal_pool(pages: &[PageArtifact]) -> Vec<String> {
    let mut pool = Vec::new();
    for page in pages {
        for legal_ref in &page.legal_refs {
            if !pool.contains(legal_ref) {
                pool.push(legal_ref.clone());
            }
        }
    }
    pool
}

fn legal_anchors(pages: &[PageArtifact], legal_pool: &[String]) -> Vec<LegalAnchor> {
    legal_pool
        .iter()
        .map(|norm| LegalAnchor {
            norm: norm.clone(),
            why: "Нормативная база влияет на условия БГ".into(),
            sources: pages
                .iter()
                .filter(|p| p.legal_refs.contains(norm))
                .map(|p| p.url.clone())
                .take(LEGAL_ANCHOR_SOURCE_LIMIT)
                .collect(),
        })
        .collect()
}
