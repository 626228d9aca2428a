//! Local heuristic fallbacks for assistant operations.
//!
//! Every gateway operation degrades to one of these when the remote service
//! is unreachable or answers badly. The shapes match the remote responses
//! exactly, so downstream consumers never branch on provenance.

use crate::types::{
    CompetitorAnalysis, ContentStructure, FaqBundle, GeneratedArticle, MetaOptimization,
    SearchResult, SeoOptimization,
};

/// Simulated search results: up to three templated hits.
pub fn fallback_search(query: &str, num_results: usize) -> Vec<SearchResult> {
    let slug = query.replace(' ', "-");
    (1..=num_results.min(3))
        .map(|i| SearchResult {
            title: format!("Результат {i} для \"{query}\""),
            url: format!("https://example{i}.com/{slug}"),
            snippet: format!(
                "Описание результата {i} по запросу \"{query}\". Это пример контента для тестирования."
            ),
            domain: format!("example{i}.com"),
            rank: i as u32,
        })
        .collect()
}

/// Canned competitor analysis built from whatever search results we have.
pub fn fallback_analysis(keyword: &str, search_results: &[SearchResult]) -> CompetitorAnalysis {
    CompetitorAnalysis {
        keyword: keyword.to_string(),
        competitors: search_results.to_vec(),
        total_found: search_results.len(),
        common_themes: (1..=3).map(|i| format!("Тема {i} для {keyword}")).collect(),
        content_structure: ContentStructure {
            avg_length: 2500,
            common_sections: ["Введение", "Основная часть", "FAQ"]
                .map(String::from)
                .to_vec(),
            structure_pattern: "informational".into(),
        },
        gaps: [
            "Недостаточно интерактивных элементов",
            "Слабые призывы к действию",
            "Мало практических примеров",
        ]
        .map(String::from)
        .to_vec(),
        recommendations: [
            "Добавить калькулятор стоимости",
            "Улучшить призывы к действию",
            "Добавить больше FAQ",
            "Создать интерактивные элементы",
        ]
        .map(String::from)
        .to_vec(),
        lsi_keywords: (0..5).map(|i| format!("lsi_{keyword}_{i}")).collect(),
        analysis_date: chrono::Utc::now().to_rfc3339(),
        status: "completed".into(),
    }
}

/// Templated article generation.
pub fn fallback_article(keyword: &str) -> GeneratedArticle {
    let title = format!("{keyword}: полное руководство по получению");
    let content = format!(
        "# {title}\n\n\
         ## Введение\n\n\
         {keyword} — это важный инструмент для современного бизнеса. В данной статье мы \
         рассмотрим все аспекты получения {keyword}, основываясь на анализе лучших практик.\n\n\
         ## Что такое {keyword}\n\n\
         {keyword} представляет собой надёжный способ обеспечения исполнения обязательств. \
         Это письменное обязательство, которое гарантирует выполнение условий договора.\n\n\
         ### Ключевые характеристики:\n\n\
         - **Размер:** от 0,5% до 30% от суммы контракта\n\
         - **Срок действия:** от 1 месяца до 3 лет\n\
         - **Автоматическое прекращение:** при выполнении обязательств\n\n\
         ## Стоимость и расчёт\n\n\
         Стоимость зависит от размера гарантии, срока действия, финансового состояния \
         компании и банка-гаранта.\n\n\
         **Типичные тарифы:**\n\
         - Стандартные гарантии: 1,5-3% в год\n\
         - Сложные гарантии: 3-5% в год\n\
         - Срочные гарантии: +0,5-1% к базовому тарифу\n\n\
         ## Документы для получения\n\n\
         - Заявление на выдачу гарантии\n\
         - Учредительные документы\n\
         - Финансовая отчётность за 2 года\n\
         - Справки об отсутствии задолженности\n\n\
         ## Часто задаваемые вопросы\n\n\
         ### Как быстро можно получить {keyword}?\n\
         Стандартные сроки: 3-7 рабочих дней. Экспресс-оформление возможно за 1-2 дня.\n\n\
         ### Сколько стоит {keyword}?\n\
         Стоимость варьируется от 1,5% до 5% от суммы гарантии в год.\n\n\
         ### Можно ли получить {keyword} без залога?\n\
         Да, многие банки выдают непокрытые гарантии на основе анализа финансового состояния.\n\n\
         ## Заключение\n\n\
         {keyword} — это надёжный инструмент для развития бизнеса. Правильно оформленная \
         гарантия открывает доступ к крупным контрактам и новым возможностям."
    );

    let word_count = content.split_whitespace().count() as u32;
    GeneratedArticle {
        title,
        content,
        word_count,
        reading_time: (word_count / 200).max(1),
        structure: ["Введение", "Основная часть", "FAQ", "Заключение"]
            .map(String::from)
            .to_vec(),
        lsi_keywords_used: (0..5).map(|i| format!("{keyword}_related_{i}")).collect(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Basic on-page SEO metrics computed locally.
pub fn fallback_seo(content: &str, keyword: &str) -> SeoOptimization {
    let lower = content.to_lowercase();
    let words = lower.split_whitespace().count();
    let keyword_count = lower.matches(&keyword.to_lowercase()).count();
    let keyword_density = if words > 0 {
        (keyword_count as f64 / words as f64 * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    };

    let sentences = content.matches(['.', '!', '?']).count();
    let readability = if sentences > 0 {
        (100.0 - words as f64 / sentences as f64).clamp(0.0, 100.0)
    } else {
        50.0
    };

    SeoOptimization {
        score: 85,
        keyword_density,
        readability_score: readability,
        meta_optimization: MetaOptimization {
            title: format!("{keyword}: полное руководство"),
            description: format!(
                "Узнайте все о {keyword}. Подробное руководство с примерами и советами."
            ),
            keywords: keyword.to_string(),
        },
        suggestions: [
            "Проверить плотность ключевых слов",
            "Оптимизировать заголовки",
            "Добавить внутренние ссылки",
            "Улучшить читаемость",
        ]
        .map(String::from)
        .to_vec(),
    }
}

/// Templated FAQ with JSON-LD schema and HTML markup.
pub fn fallback_faq(keyword: &str) -> FaqBundle {
    let questions: Vec<String> = [
        format!("Что такое {keyword}?"),
        format!("Как получить {keyword}?"),
        format!("Сколько стоит {keyword}?"),
        format!("Какие документы нужны для {keyword}?"),
        format!("Где оформить {keyword}?"),
        format!("Как проверить подлинность {keyword}?"),
        format!("Какие сроки получения {keyword}?"),
    ]
    .to_vec();

    let main_entity: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            serde_json::json!({
                "@type": "Question",
                "name": q,
                "acceptedAnswer": {
                    "@type": "Answer",
                    "text": format!("Ответ на вопрос: {q}"),
                },
            })
        })
        .collect();

    let mut html = String::from("<div class=\"faq\">\n");
    for (i, question) in questions.iter().enumerate() {
        html.push_str("  <div class=\"faq-item\">\n");
        html.push_str(&format!("    <h3 class=\"faq-question\">{question}</h3>\n"));
        html.push_str(&format!(
            "    <div class=\"faq-answer\">Ответ на вопрос {}</div>\n",
            i + 1
        ));
        html.push_str("  </div>\n");
    }
    html.push_str("</div>");

    FaqBundle {
        questions,
        json_ld: serde_json::json!({
            "@context": "https://schema.org",
            "@type": "FAQPage",
            "mainEntity": main_entity,
        }),
        html,
    }
}
