//! DuckDuckGo HTML SERP parsing.
//!
//! The HTML endpoint renders organic results as `a.result__a` anchors inside
//! `div.result__body` blocks. Result links are often wrapped in a redirect of
//! the form `/l/?kh=-1&uddg=<percent-encoded-url>`, which we unwrap here.

use scraper::{Html, Selector};
use serpforge_shared::types::SerpItem;
use url::Url;

/// URL substrings that disqualify a result (tracking params, tag/search
/// pages, feeds).
const BLOCK_URL_SUBSTRINGS: &[&str] = &[
    "utm_", "yclid=", "gclid=", "/tag/", "/search?", "/?s=", "/rss",
];

/// How many raw anchors to consider before filtering down to the cap.
const RAW_ANCHOR_LIMIT: usize = 10;

/// Snippet length cap in characters.
const SNIPPET_MAX_CHARS: usize = 300;

/// Parse a DuckDuckGo HTML results page into ranked [`SerpItem`]s.
///
/// Results are deduplicated by host + path (query string ignored) and capped
/// at `max_results`. Ranks are assigned after filtering, so they are always
/// contiguous starting at 1.
pub fn parse_serp_html(html: &str, max_results: usize) -> Vec<SerpItem> {
    let doc = Html::parse_document(html);
    let anchor_sel = Selector::parse("a.result__a").expect("static selector");
    let body_sel = Selector::parse("div.result__body").expect("static selector");

    let mut results: Vec<SerpItem> = Vec::new();
    let mut seen_paths: Vec<String> = Vec::new();

    for anchor in doc.select(&anchor_sel).take(RAW_ANCHOR_LIMIT) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = unwrap_redirect(href);

        if BLOCK_URL_SUBSTRINGS.iter().any(|bad| href.contains(bad)) {
            continue;
        }

        let Ok(parsed) = Url::parse(&href) else {
            continue;
        };
        let Some(domain) = domain_of(&parsed) else {
            continue;
        };

        // Dedup by host + path, ignoring the query string.
        let path_key = format!("{domain}{}", parsed.path());
        if seen_paths.contains(&path_key) {
            continue;
        }
        seen_paths.push(path_key);

        let title = collect_text(&anchor);

        // The snippet lives in the enclosing result__body block; match it by
        // walking the anchor's ancestors.
        let snippet = anchor
            .ancestors()
            .filter_map(scraper::ElementRef::wrap)
            .find(|el| body_sel.matches(el))
            .map(|body| truncate_chars(&collect_text(&body), SNIPPET_MAX_CHARS));

        results.push(SerpItem {
            rank: results.len() as u32 + 1,
            url: href,
            title,
            publisher: Some(domain),
            snippet,
            publish_date: None,
            content_type: Some("guide".into()),
            why_selected: Some("ТОП-результат органической выдачи DDG".into()),
        });

        if results.len() == max_results {
            break;
        }
    }

    results
}

/// Unwrap a `uddg=`-style redirect link, returning the target URL.
/// Returns the input unchanged when it is not a redirect.
fn unwrap_redirect(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let query = &href[pos..];
        let query = query.split('#').next().unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "uddg" {
                return value.into_owned();
            }
        }
    }
    href.to_string()
}

/// Lowercased host with a leading `www.` stripped, or `None` for hostless URLs.
pub(crate) fn domain_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Whitespace-normalized text content of an element.
fn collect_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_block(href: &str, title: &str, snippet: &str) -> String {
        format!(
            r#"<div class="result"><div class="result__body">
                <a class="result__a" href="{href}">{title}</a>
                <a class="result__snippet">{snippet}</a>
            </div></div>"#
        )
    }

    #[test]
    fn parses_plain_results_in_order() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            result_block("https://alpha.ru/guide", "Гайд по БГ", "Как оформить гарантию"),
            result_block("https://beta.ru/faq", "FAQ", "Ответы на вопросы"),
        );
        let items = parse_serp_html(&html, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[0].url, "https://alpha.ru/guide");
        assert_eq!(items[0].title, "Гайд по БГ");
        assert_eq!(items[0].publisher.as_deref(), Some("alpha.ru"));
        assert_eq!(items[1].rank, 2);
        assert!(items[1].snippet.as_deref().unwrap().contains("Ответы"));
    }

    #[test]
    fn unwraps_uddg_redirects() {
        let html = result_block(
            "//duckduckgo.com/l/?kh=-1&uddg=https%3A%2F%2Fexample.ru%2Fbg%2Fcost&rut=abc",
            "Стоимость",
            "Сколько стоит",
        );
        let items = parse_serp_html(&html, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.ru/bg/cost");
    }

    #[test]
    fn filters_blocked_urls() {
        let html = format!(
            "{}{}{}",
            result_block("https://spam.ru/page?utm_source=x", "Spam", "..."),
            result_block("https://blog.ru/tag/guarantee", "Tag page", "..."),
            result_block("https://good.ru/article", "Good", "..."),
        );
        let items = parse_serp_html(&html, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://good.ru/article");
        assert_eq!(items[0].rank, 1);
    }

    #[test]
    fn dedups_by_host_and_path() {
        let html = format!(
            "{}{}",
            result_block("https://www.bank.ru/bg?a=1", "First", "..."),
            result_block("https://bank.ru/bg?b=2", "Duplicate", "..."),
        );
        let items = parse_serp_html(&html, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "First");
    }

    #[test]
    fn caps_at_max_results() {
        let html: String = (0..8)
            .map(|i| result_block(&format!("https://site{i}.ru/p"), "T", "S"))
            .collect();
        let items = parse_serp_html(&html, 5);
        assert_eq!(items.len(), 5);
        assert_eq!(items.last().unwrap().rank, 5);
    }

    #[test]
    fn skips_anchors_without_href() {
        let html = r#"<a class="result__a">no link</a>"#;
        assert!(parse_serp_html(html, 5).is_empty());
    }
}
