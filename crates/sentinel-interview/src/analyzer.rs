//! Fuzziness pre-analysis of a requirement description.
//!
//! Detects vague wording and disaster-prone domains before the interview
//! proper. The output is advisory metadata for callers; the gating decision
//! itself comes from [`InterviewEngine::assess`](crate::InterviewEngine::assess).

use serde::{Deserialize, Serialize};

/// Vague wording that signals an under-specified requirement.
const FUZZY_KEYWORDS: &[&str] = &[
    // quantity
    "some", "several", "many", "a few", "一些", "幾個", "多個", "很多",
    // timing
    "fast", "real-time", "realtime", "asap", "快速", "實時", "即時", "盡快",
    // scale
    "massive", "high concurrency", "large scale", "大量", "海量", "高並發", "大規模",
    // certainty
    "maybe", "probably", "should", "可能", "也許", "應該", "大概",
    // scope
    "etc", "and so on", "similar", "等等", "之類", "相關", "類似",
];

/// Domains where an unasked question becomes a production incident.
const DISASTER_KEYWORDS: &[&str] = &[
    "concurrent", "simultaneous", "multi-user", "併發", "並發", "多用戶", "同時",
    "transaction", "state", "數據", "資料", "狀態", "交易",
    "payment", "order", "money", "inventory", "支付", "訂單", "金錢", "庫存",
    "user", "auth", "permission", "password", "用戶", "認證", "權限", "密碼",
    "query", "search", "list", "pagination", "查詢", "搜索", "列表", "分頁",
];

/// Result of [`analyze_description`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionAnalysis {
    pub fuzzy_hits: Vec<String>,
    pub disaster_hits: Vec<String>,
    /// 0-10; length and keyword density both contribute.
    pub complexity_score: u8,
    pub needs_interview: bool,
}

/// Scan a free-form requirement for fuzzy wording and disaster-prone
/// domains. Deterministic: same text, same analysis.
pub fn analyze_description(description: &str) -> DescriptionAnalysis {
    let haystack = description.to_lowercase();

    let fuzzy_hits: Vec<String> = FUZZY_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect();
    let disaster_hits: Vec<String> = DISASTER_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect();

    let word_count = description.split_whitespace().count();
    let raw = word_count / 20 + fuzzy_hits.len() + disaster_hits.len();
    let complexity_score = raw.min(10) as u8;

    // Interview when anything vague or dangerous shows up, or the
    // requirement is large enough that something will have been left unsaid.
    let needs_interview =
        !fuzzy_hits.is_empty() || !disaster_hits.is_empty() || complexity_score > 5;

    DescriptionAnalysis {
        fuzzy_hits,
        disaster_hits,
        complexity_score,
        needs_interview,
    }
}
