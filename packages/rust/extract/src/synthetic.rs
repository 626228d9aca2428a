//! Synthetic fallback artifacts for unreachable pages.
//!
//! When a SERP result cannot be fetched (timeout, connection failure, or a
//! non-success status), the pipeline substitutes a fixed-template artifact so
//! downstream synthesis still sees the source. Synthetic artifacts are marked
//! and excluded from consensus computation.

use serpforge_shared::types::{FaqEntry, PageArtifact};

use crate::extractor::domain_of;

/// Build a marked fallback artifact for a URL that could not be fetched.
pub fn synthetic_artifact(url: &str) -> PageArtifact {
    let domain = domain_of(url).unwrap_or_else(|| url.to_string());

    PageArtifact {
        url: url.to_string(),
        title: format!("Страница {domain} - банковские гарантии"),
        h_outline: vec![
            "H1: Информация о банковских гарантиях".into(),
            "H2: Сроки банковских гарантий".into(),
            "H2: Требования по 44-ФЗ".into(),
            "H2: Требования по 223-ФЗ".into(),
        ],
        content_plain: format!(
            "Контент с сайта {domain} о банковских гарантиях. Срок банковской гарантии \
             определяется в соответствии с требованиями 44-ФЗ и 223-ФЗ. Минимальный срок \
             составляет 1 месяц, максимальный - до 5 лет в зависимости от вида гарантии \
             и условий договора."
        ),
        tables_tsv: vec![],
        faq: vec![
            FaqEntry {
                question: "Какой минимальный срок банковской гарантии?".into(),
                answer: "Минимальный срок составляет 1 месяц с даты исполнения обязательств."
                    .into(),
            },
            FaqEntry {
                question: "Можно ли продлить срок действия гарантии?".into(),
                answer: "Да, срок можно продлить по согласованию сторон.".into(),
            },
        ],
        calculators: vec![],
        legal_refs: vec!["44-ФЗ".into(), "223-ФЗ".into(), "ГК РФ ст. 368".into()],
        author: None,
        publisher: Some(domain),
        publish_date: None,
        update_date: None,
        schema_types: vec!["Article".into()],
        ctas: vec!["Получить расчет".into(), "Оставить заявку".into()],
        reading_time_min: 2,
        word_count: 85,
        synthetic: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_artifact_is_marked_and_templated() {
        let art = synthetic_artifact("https://unreachable.ru/bg/tender");
        assert!(art.synthetic);
        assert_eq!(art.publisher.as_deref(), Some("unreachable.ru"));
        assert!(art.title.contains("unreachable.ru"));
        assert_eq!(art.h_outline.len(), 4);
        assert_eq!(art.faq.len(), 2);
        assert_eq!(art.legal_refs, vec!["44-ФЗ", "223-ФЗ", "ГК РФ ст. 368"]);
        assert_eq!(art.schema_types, vec!["Article"]);
    }
}
