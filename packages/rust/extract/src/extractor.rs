//! Structural page extraction: HTML → [`PageArtifact`].
//!
//! The extractor pulls out the heading outline, tables, FAQ accordions,
//! calculator forms, legal citations, authorship, dates, CTAs, and JSON-LD
//! types, ignoring boilerplate regions (nav/header/footer and common
//! cookie/banner/sidebar class names). It never fails: malformed HTML just
//! yields a sparser artifact.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serpforge_shared::rules::RuleSet;
use serpforge_shared::types::{CalculatorForm, FaqEntry, PageArtifact, reading_time_min};
use url::Url;

/// Element names treated as boilerplate wholesale.
const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer"];

/// Class names marking boilerplate containers.
const BOILERPLATE_CLASSES: &[&str] = &[
    "cookie",
    "banner",
    "subscribe",
    "sidebar",
    "share",
    "breadcrumbs",
    "nav",
    "menu",
    "foot",
];

/// A title is replaced by the page H1 only when the H1 carries this many
/// characters or more.
const H1_TITLE_MIN_CHARS: usize = 11;

/// Extract a structural artifact from a fetched HTML page.
///
/// `fallback_title` is used when the page has neither a `<title>` nor a
/// substantial `<h1>`; callers typically pass the URL.
pub fn extract_artifact(
    html: &str,
    base_url: &str,
    fallback_title: &str,
    rules: &RuleSet,
) -> PageArtifact {
    let doc = Html::parse_document(html);

    let title = final_title(&doc, fallback_title);
    let h_outline = heading_outline(&doc);
    let tables_tsv = tables_as_tsv(&doc);
    let faq = faq_entries(&doc);
    let calculators = calculator_forms(&doc, rules);

    let text_all = visible_text(&doc);
    let legal_refs = legal_references(&text_all, rules);

    let author = find_author(&doc);
    let publish_date = find_publish_date(&doc);
    let ctas = cta_phrases(&doc, rules);
    let schema_types = jsonld_types(&doc);

    let content_plain = paragraph_text(&doc);
    let word_count = content_plain.split_whitespace().count() as u32;

    PageArtifact {
        url: base_url.to_string(),
        title: if title.is_empty() {
            if fallback_title.is_empty() {
                base_url.to_string()
            } else {
                fallback_title.to_string()
            }
        } else {
            title
        },
        h_outline,
        content_plain,
        tables_tsv,
        faq,
        calculators,
        legal_refs,
        author,
        publisher: domain_of(base_url),
        publish_date,
        update_date: None,
        schema_types,
        ctas,
        reading_time_min: reading_time_min(word_count),
        word_count,
        synthetic: false,
    }
}

/// Lowercased host of a URL with a leading `www.` stripped.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Parse a `YYYY-MM-DD` or `DD.MM.YYYY` date string.
pub fn normalize_date_str(s: &str) -> Option<chrono::NaiveDate> {
    let s = s.trim();
    if Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok()?.is_match(s) {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    if Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").ok()?.is_match(s) {
        return chrono::NaiveDate::parse_from_str(s, "%d.%m.%Y").ok();
    }
    None
}

// ---------------------------------------------------------------------------
// Boilerplate filtering
// ---------------------------------------------------------------------------

fn is_boilerplate_element(el: &scraper::node::Element) -> bool {
    BOILERPLATE_TAGS.contains(&el.name())
        || el.classes().any(|c| BOILERPLATE_CLASSES.contains(&c))
}

/// Whether an element sits inside (or is itself) a boilerplate region.
fn in_boilerplate(el: &ElementRef<'_>) -> bool {
    if is_boilerplate_element(el.value()) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_boilerplate_element(a.value()))
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Whitespace-normalized text content of an element.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Extraction pieces
// ---------------------------------------------------------------------------

/// `<title>` text, upgraded to the page H1 when the H1 looks substantial.
/// Boilerplate filtering does not apply here: a hero H1 inside `<header>`
/// still names the page.
fn final_title(doc: &Html, fallback_title: &str) -> String {
    let mut title = doc
        .select(&sel("title"))
        .next()
        .map(|t| element_text(&t))
        .unwrap_or_else(|| fallback_title.to_string());

    if let Some(h1) = doc.select(&sel("h1")).next() {
        let h1_text = element_text(&h1);
        if h1_text.chars().count() >= H1_TITLE_MIN_CHARS {
            title = h1_text;
        }
    }
    title
}

/// Document-ordered H1–H3 outline, entries formatted as `"H2: <text>"`.
fn heading_outline(doc: &Html) -> Vec<String> {
    let mut outline = Vec::new();
    for h in doc.select(&sel("h1, h2, h3")) {
        if in_boilerplate(&h) {
            continue;
        }
        let text = element_text(&h);
        if !text.is_empty() {
            outline.push(format!("{}: {text}", h.value().name().to_uppercase()));
        }
    }
    outline
}

/// Each `<table>` becomes one TSV block: cells tab-joined, rows
/// newline-joined.
fn tables_as_tsv(doc: &Html) -> Vec<String> {
    let row_sel = sel("tr");
    let cell_sel = sel("th, td");

    let mut tables = Vec::new();
    for table in doc.select(&sel("table")) {
        if in_boilerplate(&table) {
            continue;
        }
        let rows: Vec<String> = table
            .select(&row_sel)
            .map(|tr| {
                tr.select(&cell_sel)
                    .map(|c| element_text(&c))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect();
        if !rows.is_empty() {
            tables.push(rows.join("\n"));
        }
    }
    tables
}

/// FAQ pairs from `<details>/<summary>` disclosure markup. The answer is the
/// full details text, matching how accordions render when expanded.
fn faq_entries(doc: &Html) -> Vec<FaqEntry> {
    let summary_sel = sel("summary");

    let mut faq = Vec::new();
    for details in doc.select(&sel("details")) {
        if in_boilerplate(&details) {
            continue;
        }
        if let Some(summary) = details.select(&summary_sel).next() {
            faq.push(FaqEntry {
                question: element_text(&summary),
                answer: element_text(&details),
            });
        }
    }
    faq
}

/// Calculator detection: a form qualifies when its labels mention a
/// configured term (sum/term/rate/commission stems) or an input name/id
/// matches the configured pattern.
fn calculator_forms(doc: &Html, rules: &RuleSet) -> Vec<CalculatorForm> {
    let label_sel = sel("label");
    let input_sel = sel("input, select");
    let input_re = Regex::new(&rules.calculator_input_pattern).ok();

    let mut calculators = Vec::new();
    for form in doc.select(&sel("form")) {
        if in_boilerplate(&form) {
            continue;
        }

        let labels: Vec<String> = form
            .select(&label_sel)
            .map(|l| element_text(&l).to_lowercase())
            .collect();
        let inputs: Vec<String> = form
            .select(&input_sel)
            .map(|i| {
                i.value()
                    .attr("name")
                    .or_else(|| i.value().attr("id"))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        let joined_labels = labels.join(" ");
        let label_hit = rules
            .calculator_label_terms
            .iter()
            .any(|term| joined_labels.contains(term.as_str()));
        let input_hit = input_re
            .as_ref()
            .is_some_and(|re| inputs.iter().any(|i| re.is_match(i)));

        if label_hit || input_hit {
            let mut seen = if labels.iter().any(|l| !l.is_empty()) {
                labels.clone()
            } else {
                inputs.clone()
            };
            seen.retain(|s| !s.is_empty());
            seen.dedup();
            calculators.push(CalculatorForm {
                name: form
                    .value()
                    .attr("id")
                    .unwrap_or("calculator")
                    .to_string(),
                inputs: seen,
                notes: "Heuristic detection of calculator form".into(),
            });
        }
    }
    calculators
}

/// All visible text of the document, boilerplate and script/style excluded.
fn visible_text(doc: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skip = node.ancestors().filter_map(ElementRef::wrap).any(|a| {
            let name = a.value().name();
            name == "script" || name == "style" || is_boilerplate_element(a.value())
        });
        if !skip {
            parts.push(&**text);
        }
    }
    parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Legal citations in first-occurrence order, deduplicated.
fn legal_references(text: &str, rules: &RuleSet) -> Vec<String> {
    let mut hits: Vec<(usize, String)> = Vec::new();
    for pattern in &rules.legal_patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for m in re.find_iter(text) {
            hits.push((m.start(), m.as_str().to_string()));
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);

    let mut refs = Vec::new();
    for (_, text) in hits {
        if !refs.contains(&text) {
            refs.push(text);
        }
    }
    refs
}

/// Author from microdata, common class names, or a meta tag, in that
/// priority order.
fn find_author(doc: &Html) -> Option<String> {
    for css in [
        r#"[itemprop="author"]"#,
        ".author",
        ".article-author",
        r#"meta[name="author"]"#,
    ] {
        if let Some(node) = doc.select(&sel(css)).find(|n| !in_boilerplate(n)) {
            let value = node
                .value()
                .attr("content")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(&node));
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Publish date from `itemprop="datePublished"` or the first `<time>`,
/// preferring the `datetime` attribute over visible text.
fn find_publish_date(doc: &Html) -> Option<chrono::NaiveDate> {
    let candidate = doc
        .select(&sel(r#"[itemprop="datePublished"]"#))
        .next()
        .or_else(|| doc.select(&sel("time")).next())?;

    if let Some(datetime) = candidate.value().attr("datetime") {
        let head: String = datetime.chars().take(10).collect();
        return normalize_date_str(&head);
    }
    normalize_date_str(&element_text(&candidate))
}

/// Anchor texts matching a configured CTA phrase, deduplicated.
fn cta_phrases(doc: &Html, rules: &RuleSet) -> Vec<String> {
    let mut ctas = Vec::new();
    for a in doc.select(&sel("a")) {
        if in_boilerplate(&a) {
            continue;
        }
        let text = element_text(&a);
        let lower = text.to_lowercase();
        if rules.cta_phrases.iter().any(|p| lower.contains(p.as_str())) && !ctas.contains(&text) {
            ctas.push(text);
        }
    }
    ctas
}

/// schema.org `@type` values from embedded JSON-LD in first-occurrence order,
/// deduplicated across blocks. Tolerant of top-level objects, arrays of
/// objects, and string-or-array `@type` values.
fn jsonld_types(doc: &Html) -> Vec<String> {
    let mut types = Vec::new();
    for script in doc.select(&sel(r#"script[type="application/ld+json"]"#)) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        match value {
            serde_json::Value::Object(ref obj) => push_type(obj.get("@type"), &mut types),
            serde_json::Value::Array(items) => {
                for item in items {
                    if let serde_json::Value::Object(ref obj) = item {
                        push_type(obj.get("@type"), &mut types);
                    }
                }
            }
            _ => {}
        }
    }
    types
}

fn push_type(value: Option<&serde_json::Value>, out: &mut Vec<String>) {
    match value {
        Some(serde_json::Value::String(s)) => {
            if !out.contains(s) {
                out.push(s.clone());
            }
        }
        Some(serde_json::Value::Array(items)) => {
            for item in items {
                if let serde_json::Value::String(s) = item {
                    if !out.contains(s) {
                        out.push(s.clone());
                    }
                }
            }
        }
        _ => {}
    }
}

/// Main text: all `<p>` and `<li>` content joined with spaces.
fn paragraph_text(doc: &Html) -> String {
    let mut parts = Vec::new();
    for node in doc.select(&sel("p, li")) {
        if in_boilerplate(&node) {
            continue;
        }
        let text = element_text(&node);
        if !text.is_empty() {
            parts.push(text);
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> PageArtifact {
        extract_artifact(html, "https://bank.example/bg", "", &RuleSet::default())
    }

    #[test]
    fn title_prefers_substantial_h1() {
        let art = extract(
            "<html><head><title>Короткий тайтл</title></head>\
             <body><h1>Банковская гарантия под 44-ФЗ за 1 день</h1></body></html>",
        );
        assert_eq!(art.title, "Банковская гарантия под 44-ФЗ за 1 день");
    }

    #[test]
    fn title_keeps_tag_when_h1_is_short() {
        let art = extract(
            "<html><head><title>Банковская гарантия — оформление</title></head>\
             <body><h1>БГ</h1></body></html>",
        );
        assert_eq!(art.title, "Банковская гарантия — оформление");
    }

    #[test]
    fn title_falls_back_to_url() {
        let art = extract("<html><body><p>нет заголовков</p></body></html>");
        assert_eq!(art.title, "https://bank.example/bg");
    }

    #[test]
    fn outline_is_document_ordered_and_skips_boilerplate() {
        let art = extract(
            r#"<body>
                <nav><h2>Меню</h2></nav>
                <h1>Банковская гарантия: полный гайд</h1>
                <h2>Стоимость</h2>
                <div class="sidebar"><h3>Похожие статьи</h3></div>
                <h3>Комиссия банка</h3>
            </body>"#,
        );
        assert_eq!(
            art.h_outline,
            vec![
                "H1: Банковская гарантия: полный гайд",
                "H2: Стоимость",
                "H3: Комиссия банка"
            ]
        );
    }

    #[test]
    fn tables_become_tsv() {
        let art = extract(
            "<table><tr><th>Банк</th><th>Ставка</th></tr>\
             <tr><td>Альфа</td><td>3%</td></tr></table>",
        );
        assert_eq!(art.tables_tsv.len(), 1);
        assert_eq!(art.tables_tsv[0], "Банк\tСтавка\nАльфа\t3%");
    }

    #[test]
    fn faq_from_details_summary() {
        let art = extract(
            "<details><summary>Сколько стоит БГ?</summary>\
             <p>От 2% годовых.</p></details>",
        );
        assert_eq!(art.faq.len(), 1);
        assert_eq!(art.faq[0].question, "Сколько стоит БГ?");
        assert!(art.faq[0].answer.contains("От 2% годовых."));
    }

    #[test]
    fn calculator_detected_by_label() {
        let art = extract(
            r#"<form id="bg-calc">
                <label>Сумма гарантии</label><input name="x1">
                <label>Срок, дней</label><input name="x2">
            </form>"#,
        );
        assert_eq!(art.calculators.len(), 1);
        assert_eq!(art.calculators[0].name, "bg-calc");
        assert!(art.calculators[0].inputs.contains(&"сумма гарантии".to_string()));
    }

    #[test]
    fn calculator_detected_by_input_name() {
        let art = extract(r#"<form><input name="guarantee_amount"></form>"#);
        assert_eq!(art.calculators.len(), 1);
        assert_eq!(art.calculators[0].name, "calculator");
        assert_eq!(art.calculators[0].inputs, vec!["guarantee_amount"]);
    }

    #[test]
    fn plain_form_is_not_a_calculator() {
        let art = extract(r#"<form><label>Ваше имя</label><input name="fio"></form>"#);
        assert!(art.calculators.is_empty());
    }

    #[test]
    fn legal_refs_deduped_in_first_seen_order() {
        let art = extract(
            "<p>По 44-ФЗ и 223-ФЗ. Согласно ГК РФ ст. 368 и снова 44-ФЗ. \
             См. Постановление Правительства РФ № 1005.</p>",
        );
        assert_eq!(
            art.legal_refs,
            vec![
                "44-ФЗ",
                "223-ФЗ",
                "ГК РФ ст. 368",
                "Постановление Правительства РФ № 1005"
            ]
        );
    }

    #[test]
    fn author_priority_microdata_over_meta() {
        let art = extract(
            r#"<head><meta name="author" content="Мета Автор"></head>
               <body><span itemprop="author">Иван Петров</span></body>"#,
        );
        assert_eq!(art.author.as_deref(), Some("Иван Петров"));
    }

    #[test]
    fn author_from_meta_content() {
        let art = extract(r#"<head><meta name="author" content="Редакция"></head>"#);
        assert_eq!(art.author.as_deref(), Some("Редакция"));
    }

    #[test]
    fn publish_date_from_time_datetime_attr() {
        let art = extract(r#"<time datetime="2025-03-14T10:00:00Z">14 марта</time>"#);
        assert_eq!(
            art.publish_date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn publish_date_from_dotted_text() {
        let art = extract(r#"<span itemprop="datePublished">14.03.2025</span>"#);
        assert_eq!(
            art.publish_date,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn unparseable_date_is_none() {
        let art = extract("<time>вчера</time>");
        assert!(art.publish_date.is_none());
    }

    #[test]
    fn ctas_matched_and_deduped() {
        let art = extract(
            r##"<a href="#">Оставить заявку</a>
               <a href="#">Оставить заявку</a>
               <a href="#">Рассчитать стоимость онлайн</a>
               <a href="#">О компании</a>"##,
        );
        assert_eq!(
            art.ctas,
            vec!["Оставить заявку", "Рассчитать стоимость онлайн"]
        );
    }

    #[test]
    fn jsonld_types_tolerant() {
        let art = extract(
            r#"<script type="application/ld+json">{"@type":"Article"}</script>
               <script type="application/ld+json">[{"@type":"FAQPage"},{"name":"no type"}]</script>
               <script type="application/ld+json">not json at all</script>"#,
        );
        assert_eq!(art.schema_types, vec!["Article", "FAQPage"]);
    }

    #[test]
    fn jsonld_types_dedup_across_blocks() {
        let art = extract(
            r#"<script type="application/ld+json">{"@type":"Article"}</script>
               <script type="application/ld+json">{"@type":"FAQPage"}</script>
               <script type="application/ld+json">{"@type":["Article","BreadcrumbList"]}</script>"#,
        );
        assert_eq!(art.schema_types, vec!["Article", "FAQPage", "BreadcrumbList"]);
    }

    #[test]
    fn word_count_and_reading_time() {
        let body = "<p>слово </p>".repeat(450);
        let art = extract(&body);
        assert_eq!(art.word_count, 450);
        assert_eq!(art.reading_time_min, 2);

        let art = extract("<p>пара слов</p>");
        assert_eq!(art.word_count, 2);
        assert_eq!(art.reading_time_min, 1);
    }

    #[test]
    fn publisher_from_url_host() {
        let art = extract_artifact(
            "<p>x</p>",
            "https://www.Bank.Example/page",
            "",
            &RuleSet::default(),
        );
        assert_eq!(art.publisher.as_deref(), Some("bank.example"));
    }

    #[test]
    fn artifact_is_not_synthetic() {
        assert!(!extract("<p>x</p>").synthetic);
    }
}
