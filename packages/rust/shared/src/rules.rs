//! Editable heuristic rule tables.
//!
//! CTA phrases, calculator vocabulary, legal-citation patterns, disagreement
//! rules, and domain terms are product/domain knowledge, not derived
//! computation — they ship as defaults here and can be overridden from the
//! `[rules]` section of the config file.

use serde::{Deserialize, Serialize};

/// A canned disagreement statement triggered by substring needles in the
/// combined corpus text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisagreementRule {
    /// Substrings (stems) to look for.
    pub needles: Vec<String>,
    /// When true, every needle must be present; otherwise any one suffices.
    #[serde(default)]
    pub match_all: bool,
    /// Statement emitted when the rule fires.
    pub statement: String,
}

/// The full rule table consumed by the extractor and the synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    /// Anchor-text phrases counted as calls to action.
    #[serde(default = "default_cta_phrases")]
    pub cta_phrases: Vec<String>,

    /// Label stems marking a form as a calculator.
    #[serde(default = "default_calculator_label_terms")]
    pub calculator_label_terms: Vec<String>,

    /// Regex matched against input/select name or id attributes.
    #[serde(default = "default_calculator_input_pattern")]
    pub calculator_input_pattern: String,

    /// Regexes for statute-name citations.
    #[serde(default = "default_legal_patterns")]
    pub legal_patterns: Vec<String>,

    /// Disagreement rules evaluated over the combined corpus text.
    #[serde(default = "default_disagreement_rules")]
    pub disagreement_rules: Vec<DisagreementRule>,

    /// Fixed domain-term entity list.
    #[serde(default = "default_domain_terms")]
    pub domain_terms: Vec<String>,

    /// Must-have content blocks for the synthesis.
    #[serde(default = "default_must_have_blocks")]
    pub must_have_blocks: Vec<String>,

    /// YMYL risk/compliance reminders.
    #[serde(default = "default_risk_compliance")]
    pub risk_compliance: Vec<String>,

    /// Freshness requirements.
    #[serde(default = "default_freshness")]
    pub freshness: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            cta_phrases: default_cta_phrases(),
            calculator_label_terms: default_calculator_label_terms(),
            calculator_input_pattern: default_calculator_input_pattern(),
            legal_patterns: default_legal_patterns(),
            disagreement_rules: default_disagreement_rules(),
            domain_terms: default_domain_terms(),
            must_have_blocks: default_must_have_blocks(),
            risk_compliance: default_risk_compliance(),
            freshness: default_freshness(),
        }
    }
}

fn default_cta_phrases() -> Vec<String> {
    [
        "оставить заявку",
        "получить расчёт",
        "подать заявку",
        "оформить гарантию",
        "рассчитать стоимость",
    ]
    .map(String::from)
    .to_vec()
}

fn default_calculator_label_terms() -> Vec<String> {
    ["сумма", "срок", "ставк", "комисс"].map(String::from).to_vec()
}

fn default_calculator_input_pattern() -> String {
    "(?i)(sum|amount|term|rate|commission)".into()
}

fn default_legal_patterns() -> Vec<String> {
    [
        r"(?i)44-ФЗ",
        r"(?i)223-ФЗ",
        r"(?i)ГК\s*РФ\s*ст\.\s*\d+",
        r"(?i)Постановление\s*Правительства\s*РФ\s*№\s*\d+",
    ]
    .map(String::from)
    .to_vec()
}

fn default_disagreement_rules() -> Vec<DisagreementRule> {
    vec![
        DisagreementRule {
            needles: vec!["ставк".into(), "комисси".into()],
            match_all: false,
            statement: "Диапазоны комиссий/ставок различаются по банкам и видам БГ.".into(),
        },
        DisagreementRule {
            needles: vec!["срок".into()],
            match_all: false,
            statement: "Срок выпуска варьируется (от «за 1 день» до «3–5 рабочих дней»).".into(),
        },
        DisagreementRule {
            needles: vec!["обеспечени".into(), "исполнени".into()],
            match_all: true,
            statement:
                "Требования бенефициара по документам различаются для вида БГ (тендер/исполнение/аванс)."
                    .into(),
        },
    ]
}

fn default_domain_terms() -> Vec<String> {
    [
        "независимая банковская гарантия",
        "бенефициар",
        "контргарантия",
        "тендерная БГ",
        "БГ на исполнение",
        "БГ на аванс",
    ]
    .map(String::from)
    .to_vec()
}

fn default_must_have_blocks() -> Vec<String> {
    [
        "FAQ",
        "Calculator",
        "Документы чек-лист",
        "Таблица тарифов/ставок",
        "Примеры гарантийных писем",
    ]
    .map(String::from)
    .to_vec()
}

fn default_risk_compliance() -> Vec<String> {
    [
        "YMYL: указать дисклеймер (не финсовет).",
        "Обновлять тарифы/сроки; указывать точную дату актуальности.",
    ]
    .map(String::from)
    .to_vec()
}

fn default_freshness() -> Vec<String> {
    ["Тарифы/ставки и SLA обновлять минимум раз в квартал.".to_string()].to_vec()
}
