//! Validation report types — the aggregated outcome of one pipeline run.

use serde::{Deserialize, Serialize};

/// Per-layer verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
    /// The layer did not run: a structural gate failed first, or the layer's
    /// declared prerequisite did not pass. Distinct from `Pass` by design.
    Skipped,
}

/// Whether a failing verdict blocks the overall run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Advisory,
    Fatal,
}

/// Outcome of one validation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer_index: u8,
    pub layer_name: String,
    pub verdict: Verdict,
    pub severity: Severity,
    pub detail: String,
}

impl LayerResult {
    /// A fatal `Fail` — the only kind of result that blocks the run.
    pub fn is_fatal_failure(&self) -> bool {
        self.verdict == Verdict::Fail && self.severity == Severity::Fatal
    }
}

/// The outcome of one full pipeline run. Created by
/// [`finalize`](ValidationReport::finalize), immutable afterwards, appended
/// to the owning node's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub id: String,
    pub layer_results: Vec<LayerResult>,
    /// `Pass` iff no layer is a fatal `Fail`. `Warn` entries never block.
    pub overall_verdict: Verdict,
    /// Passed layers over total layers, 0-100.
    pub quality_score: u8,
    /// Up to five `L{n} ({name}): {detail}` lines for failing layers.
    pub suggestions: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ValidationReport {
    /// Compute the aggregate verdict, score, and suggestions from per-layer
    /// results, sorted by ascending layer index.
    pub fn finalize(mut layer_results: Vec<LayerResult>) -> Self {
        layer_results.sort_by_key(|r| r.layer_index);

        let fatal_failure = layer_results.iter().any(LayerResult::is_fatal_failure);
        let overall_verdict = if fatal_failure { Verdict::Fail } else { Verdict::Pass };

        let total = layer_results.len().max(1);
        let passed = layer_results
            .iter()
            .filter(|r| matches!(r.verdict, Verdict::Pass))
            .count();
        let quality_score = ((passed * 100) / total) as u8;

        let suggestions = layer_results
            .iter()
            .filter(|r| matches!(r.verdict, Verdict::Fail | Verdict::Warn))
            .take(5)
            .map(|r| format!("L{} ({}): {}", r.layer_index, r.layer_name, r.detail))
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            layer_results,
            overall_verdict,
            quality_score,
            suggestions,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn passed(&self) -> bool {
        self.overall_verdict == Verdict::Pass
    }

    /// Fatal failures, in layer order.
    pub fn fatal_failures(&self) -> Vec<&LayerResult> {
        self.layer_results
            .iter()
            .filter(|r| r.is_fatal_failure())
            .collect()
    }
}
