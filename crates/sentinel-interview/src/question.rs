//! Question types: bilingual prompts, risk triggers, and the fixed category
//! taxonomy with its priority ranking.

use serde::{Deserialize, Serialize};

/// Prompt language selector. The library carries both renditions; callers
/// pick one at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-US")]
    #[default]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

/// A bilingual text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptText {
    pub en_us: String,
    pub zh_tw: String,
}

impl PromptText {
    pub fn new(en_us: impl Into<String>, zh_tw: impl Into<String>) -> Self {
        Self {
            en_us: en_us.into(),
            zh_tw: zh_tw.into(),
        }
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::EnUs => &self.en_us,
            Language::ZhTw => &self.zh_tw,
        }
    }
}

/// Fixed question taxonomy. The ranking decides which unanswered question is
/// asked first: data-integrity > concurrency > security > failure-handling >
/// everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    DataIntegrity,
    Concurrency,
    Security,
    FailureHandling,
    Recovery,
    StateManagement,
    Performance,
}

impl QuestionCategory {
    /// Rank within the fixed priority ordering; lower asks first.
    pub fn priority(&self) -> u8 {
        match self {
            QuestionCategory::DataIntegrity => 0,
            QuestionCategory::Concurrency => 1,
            QuestionCategory::Security => 2,
            QuestionCategory::FailureHandling => 3,
            _ => 4,
        }
    }
}

/// Predicate over a node's description and spec text. Matches when any
/// keyword appears, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTrigger {
    pub keywords: Vec<String>,
}

impl RiskTrigger {
    pub fn any_of(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()))
    }
}

/// One answer choice, with the risk trade-off it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: PromptText,
    pub risk_note: PromptText,
}

/// One clarification item in the fixed library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: QuestionCategory,
    pub required: bool,
    pub trigger: RiskTrigger,
    pub prompt: PromptText,
    pub options: Vec<QuestionOption>,
}
