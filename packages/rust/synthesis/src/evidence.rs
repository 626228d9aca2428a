//! Evidence pack and E-E-A-T checks.
//!
//! The evidence pack is a flat list of citable numeric facts (value, source
//! URL, quote) that appear in at least two corpus pages; the E-E-A-T check
//! records which trust signals each page carries.

use regex::Regex;
use serpforge_shared::types::{EeatCheck, EvidenceFact, PageArtifact};

use crate::{NUMERIC_PATTERN, truncate_chars};

/// Evidence pack size cap.
const EVIDENCE_LIMIT: usize = 30;

/// Characters of context on each side of a cited value.
const EVIDENCE_CONTEXT_CHARS: usize = 60;

/// Quote length cap in characters.
const QUOTE_MAX_CHARS: usize = 120;

/// schema.org types counted as article markup.
const ARTICLE_SCHEMA_TYPES: &[&str] = &["Article", "NewsArticle", "BlogPosting"];

/// Collect citable numeric facts found in at least two pages.
///
/// Each distinct value yields one fact citing the first page it appears on.
/// Synthetic artifacts do not count as corroboration.
pub fn evidence_pack(pages: &[PageArtifact]) -> Vec<EvidenceFact> {
    let re = Regex::new(NUMERIC_PATTERN).expect("static pattern");
    let real_pages: Vec<&PageArtifact> = pages.iter().filter(|p| !p.synthetic).collect();

    let combined = real_pages
        .iter()
        .map(|p| p.content_plain.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut seen_values: Vec<String> = Vec::new();
    let mut facts = Vec::new();

    for m in re.find_iter(&combined) {
        let value = m.as_str().to_string();
        if seen_values.contains(&value) {
            continue;
        }
        seen_values.push(value.clone());

        let citing: Vec<&&PageArtifact> = real_pages
            .iter()
            .filter(|p| p.content_plain.contains(&value))
            .collect();
        if citing.len() < 2 {
            continue;
        }

        let first = citing[0];
        let quote = first
            .content_plain
            .find(&value)
            .map(|idx| {
                truncate_chars(
                    &context_window(&first.content_plain, idx, value.len()),
                    QUOTE_MAX_CHARS,
                )
            })
            .unwrap_or_default();

        facts.push(EvidenceFact {
            value,
            source_url: first.url.clone(),
            quote,
        });
        if facts.len() == EVIDENCE_LIMIT {
            break;
        }
    }

    facts
}

/// Context window around a byte index, measured in characters on each side.
fn context_window(text: &str, idx: usize, len: usize) -> String {
    let before: String = text[..idx]
        .chars()
        .rev()
        .take(EVIDENCE_CONTEXT_CHARS)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: String = text[idx + len..].chars().take(EVIDENCE_CONTEXT_CHARS).collect();
    format!("{before}{}{after}", &text[idx..idx + len])
}

/// Record which trust signals a page carries.
pub fn eeat_check(artifact: &PageArtifact) -> EeatCheck {
    EeatCheck {
        url: artifact.url.clone(),
        has_author: artifact.author.is_some(),
        has_date: artifact.publish_date.is_some() || artifact.update_date.is_some(),
        has_legal_refs: !artifact.legal_refs.is_empty(),
        has_schema: artifact
            .schema_types
            .iter()
            .any(|t| ARTICLE_SCHEMA_TYPES.contains(&t.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, content: &str) -> PageArtifact {
        PageArtifact {
            url: url.into(),
            title: "t".into(),
            h_outline: vec![],
            content_plain: content.into(),
            tables_tsv: vec![],
            faq: vec![],
            calculators: vec![],
            legal_refs: vec![],
            author: None,
            publisher: None,
            publish_date: None,
            update_date: None,
            schema_types: vec![],
            ctas: vec![],
            reading_time_min: 1,
            word_count: content.split_whitespace().count() as u32,
            synthetic: false,
        }
    }

    #[test]
    fn evidence_needs_two_citing_pages() {
        let pages = vec![
            page("https://a.ru/1", "Комиссия 3% за выпуск"),
            page("https://b.ru/1", "Ставка 3% в среднем"),
            page("https://c.ru/1", "Уникальные 7% здесь"),
        ];
        let facts = evidence_pack(&pages);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].value, "3%");
        assert_eq!(facts[0].source_url, "https://a.ru/1");
        assert!(facts[0].quote.contains("3%"));
    }

    #[test]
    fn evidence_values_are_distinct() {
        let pages = vec![
            page("https://a.ru/1", "3% и снова 3% и ещё 3%"),
            page("https://b.ru/1", "3% в другом месте"),
        ];
        let facts = evidence_pack(&pages);
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn evidence_caps_at_thirty() {
        let values: Vec<String> = (1..=40).map(|i| format!("{i}%")).collect();
        let content = values.join(" и ");
        let pages = vec![
            page("https://a.ru/1", &content),
            page("https://b.ru/1", &content),
        ];
        let facts = evidence_pack(&pages);
        assert_eq!(facts.len(), 30);
    }

    #[test]
    fn synthetic_pages_excluded_from_evidence() {
        let mut fake = page("https://fake.ru/1", "Ставка 3%");
        fake.synthetic = true;
        let pages = vec![page("https://a.ru/1", "Комиссия 3%"), fake];
        assert!(evidence_pack(&pages).is_empty());
    }

    #[test]
    fn eeat_check_signals() {
        let mut art = page("https://a.ru/1", "");
        let check = eeat_check(&art);
        assert!(!check.has_author && !check.has_date && !check.has_legal_refs);
        assert!(!check.has_schema);

        art.author = Some("Иван".into());
        art.publish_date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1);
        art.legal_refs = vec!["44-ФЗ".into()];
        art.schema_types = vec!["FAQPage".into(), "Article".into()];
        let check = eeat_check(&art);
        assert!(check.has_author && check.has_date && check.has_legal_refs && check.has_schema);
        assert_eq!(check.url, "https://a.ru/1");
    }

    #[test]
    fn faqpage_alone_is_not_article_schema() {
        let mut art = page("https://a.ru/1", "");
        art.schema_types = vec!["FAQPage".into()];
        assert!(!eeat_check(&art).has_schema);
    }
}
