//! Deterministic SEO blueprint generation.
//!
//! The blueprint is a pure function of `(keyword, corpus, today)`: titles and
//! meta follow fixed templates, the outline comes from the corpus (with a
//! fixed default when the corpus is empty), and the slug is a Cyrillic→Latin
//! transliteration of the keyword. Identical inputs yield byte-identical
//! output.

mod slug;

use chrono::NaiveDate;
use serpforge_shared::types::{CorpusSynthesis, FaqEntry, InternalLink, SeoBlueprint};

pub use slug::slugify_ru_to_lat;

/// Meta description hard cap in characters.
const META_MAX_CHARS: usize = 160;

/// When over the cap, the meta is cut here and an ellipsis appended.
const META_TRUNCATE_AT: usize = 157;

/// Build the content blueprint for a keyword from its synthesized corpus.
pub fn build_blueprint(keyword: &str, corpus: &CorpusSynthesis, today: NaiveDate) -> SeoBlueprint {
    let meta = {
        let full = format!(
            "{keyword} — калькулятор, ставки, сроки выпуска и список документов. Обновлено: {today}."
        );
        if full.chars().count() > META_MAX_CHARS {
            let head: String = full.chars().take(META_TRUNCATE_AT).collect();
            format!("{head}…")
        } else {
            full
        }
    };

    let outline = if corpus.common_outline.is_empty() {
        default_outline()
    } else {
        corpus.common_outline.clone()
    };

    SeoBlueprint {
        title: format!("{keyword}: стоимость, сроки и документы"),
        h1: keyword.to_string(),
        slug: slugify_ru_to_lat(keyword),
        meta_description: meta,
        outline,
        blocks: default_blocks(),
        faq: default_faq(),
        internal_links: default_internal_links(),
        eeat: vec![
            "Автор-эксперт: финансовый юрист/банковский менеджер БГ (профиль+линк).".into(),
            "Дисклеймер: материал носит информационный характер и не является \
             финансовой/юридической рекомендацией."
                .into(),
            format!("Дата обновления: {today}."),
        ],
        tech: vec![
            "LCP<=2.5s".into(),
            "CLS<=0.1".into(),
            "TBT<=200ms".into(),
            "IMG WebP<=300KB".into(),
        ],
        schema: vec!["Article".into(), "FAQPage".into(), "BreadcrumbList".into()],
    }
}

/// Build a blueprint dated today (UTC). Prefer [`build_blueprint`] where
/// determinism matters.
pub fn build_blueprint_now(keyword: &str, corpus: &CorpusSynthesis) -> SeoBlueprint {
    build_blueprint(keyword, corpus, chrono::Utc::now().date_naive())
}

fn default_outline() -> Vec<String> {
    [
        "H2 Что такое банковская гарантия",
        "H2 Виды БГ: тендерная, исполнение, аванс, возврат аванса",
        "H2 Стоимость и ставки (калькулятор)",
        "H2 Сроки выпуска и SLA",
        "H2 Документы и требования бенефициара",
        "H2 Риски и причины отказов",
        "H2 Правовая база (ГК РФ, 44-ФЗ/223-ФЗ)",
        "H2 Частые вопросы",
    ]
    .map(String::from)
    .to_vec()
}

fn default_blocks() -> Vec<String> {
    ["FAQ", "Calculator", "Docs Checklist", "Tariff Table", "Sample Letter"]
        .map(String::from)
        .to_vec()
}

fn default_faq() -> Vec<FaqEntry> {
    vec![
        FaqEntry {
            question: "Сколько стоит банковская гарантия на 12 месяцев?".into(),
            answer: "Стоимость зависит от суммы, банка и вида БГ; воспользуйтесь калькулятором \
                     и условиями банка."
                .into(),
        },
        FaqEntry {
            question: "Как быстро выпускается БГ?".into(),
            answer: "От 1 дня до 3–5 рабочих дней в зависимости от банка и комплекта документов."
                .into(),
        },
        FaqEntry {
            question: "Какие документы требуются?".into(),
            answer: "Учредительные документы, финансовая отчётность, контракт/тендерная \
                     документация — точный перечень смотрите в чек-листе."
                .into(),
        },
        FaqEntry {
            question: "Чем отличается БГ по 44-ФЗ и 223-ФЗ?".into(),
            answer: "Требования к бенефициару и формулировкам различаются; указывайте \
                     правильные ссылки на нормы."
                .into(),
        },
    ]
}

fn default_internal_links() -> Vec<InternalLink> {
    vec![
        InternalLink {
            anchor: "Виды банковских гарантий".into(),
            target: "/vidy-bankovskih-garantiy/".into(),
        },
        InternalLink {
            anchor: "Калькулятор стоимости".into(),
            target: "/kalkulyator-bankovskoy-garantii/".into(),
        },
        InternalLink {
            anchor: "Сроки и SLA".into(),
            target: "/sroki-vypuska-bg/".into(),
        },
        InternalLink {
            anchor: "44-ФЗ vs 223-ФЗ".into(),
            target: "/bg-44fz-223fz/".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn blueprint_is_deterministic() {
        let corpus = CorpusSynthesis::default();
        let a = build_blueprint("банковская гарантия", &corpus, today());
        let b = build_blueprint("банковская гарантия", &corpus, today());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn title_and_h1_templates() {
        let bp = build_blueprint("банковская гарантия", &CorpusSynthesis::default(), today());
        assert_eq!(bp.title, "банковская гарантия: стоимость, сроки и документы");
        assert_eq!(bp.h1, "банковская гарантия");
        assert_eq!(bp.slug, "bankovskaya-garantiya");
    }

    #[test]
    fn meta_contains_date_and_respects_cap() {
        let bp = build_blueprint("банковская гарантия", &CorpusSynthesis::default(), today());
        assert!(bp.meta_description.contains("2025-06-01"));
        assert!(bp.meta_description.chars().count() <= 160);

        let long_kw = "банковская гарантия ".repeat(10);
        let bp = build_blueprint(long_kw.trim(), &CorpusSynthesis::default(), today());
        assert_eq!(bp.meta_description.chars().count(), 158);
        assert!(bp.meta_description.ends_with('…'));
    }

    #[test]
    fn outline_prefers_corpus_over_default() {
        let corpus = CorpusSynthesis {
            common_outline: vec!["H2 Сроки действия".into()],
            ..CorpusSynthesis::default()
        };
        let bp = build_blueprint("кв", &corpus, today());
        assert_eq!(bp.outline, vec!["H2 Сроки действия"]);

        let bp = build_blueprint("кв", &CorpusSynthesis::default(), today());
        assert_eq!(bp.outline.len(), 8);
        assert_eq!(bp.outline[0], "H2 Что такое банковская гарантия");
    }

    #[test]
    fn fixed_sections_are_populated() {
        let bp = build_blueprint("кв", &CorpusSynthesis::default(), today());
        assert_eq!(bp.faq.len(), 4);
        assert_eq!(bp.blocks.len(), 5);
        assert_eq!(bp.internal_links.len(), 4);
        assert_eq!(bp.schema, vec!["Article", "FAQPage", "BreadcrumbList"]);
        assert_eq!(bp.eeat.len(), 3);
        assert!(bp.eeat[2].contains("2025-06-01"));
    }
}
