//! Pipeline execution: sequential structural gates, concurrent battery,
//! deterministic merge.

use std::collections::BTreeMap;
use std::sync::Arc;

use sentinel_types::{LayerResult, Node, Severity, ValidationReport, Verdict};

use crate::layers::{standard_layers, CheckLayer, LayerInput, LayerOutcome};

/// Runs a battery of [`CheckLayer`]s over one candidate and appends the
/// finalized report to the node's history.
///
/// Execution model:
/// - Layers 1-4 run sequentially. The first fatal `Fail` among them
///   short-circuits the run: every layer that has not yet executed is
///   recorded as `Skipped`.
/// - Of the remaining layers, those without a prerequisite run concurrently;
///   those with one run afterwards, and are `Skipped` unless the
///   prerequisite's verdict was `Pass`.
/// - Results are merged in ascending layer order regardless of completion
///   order, so two runs over the same input produce the same report modulo
///   id and timestamp.
pub struct ValidationPipeline {
    layers: Vec<Arc<dyn CheckLayer>>,
}

const STRUCTURAL_PHASE_END: u8 = 4;

impl ValidationPipeline {
    pub fn new(layers: Vec<Arc<dyn CheckLayer>>) -> Self {
        Self { layers }
    }

    /// The canonical 17-layer battery.
    pub fn standard() -> Self {
        Self::new(standard_layers())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Validate `code` against the node's spec and record the report.
    ///
    /// Never fails: a layer that errors internally is recorded as a fatal
    /// `Fail` for that layer, and the run continues.
    pub async fn run(&self, code: &str, node: &mut Node) -> ValidationReport {
        let input = Arc::new(LayerInput::from_node(code, node));
        let mut results: BTreeMap<u8, LayerResult> = BTreeMap::new();

        // Phase 1: structural gates, in order, short-circuiting.
        let mut short_circuited = false;
        for layer in self.structural_layers() {
            if short_circuited {
                results.insert(layer.index(), skipped(layer.as_ref(), "structural gate failed"));
                continue;
            }
            let result = execute(layer.as_ref(), &input);
            if result.is_fatal_failure() {
                tracing::warn!(
                    node = %input.node_id,
                    layer = layer.index(),
                    name = layer.name(),
                    "Structural gate failed, skipping remaining layers"
                );
                short_circuited = true;
            }
            results.insert(layer.index(), result);
        }
        if short_circuited {
            for layer in self.battery_layers() {
                results.insert(layer.index(), skipped(layer.as_ref(), "structural gate failed"));
            }
            return self.finish(node, results);
        }

        // Phase 2: independent layers, concurrently.
        let mut running = Vec::new();
        for layer in self.battery_layers() {
            if layer.prerequisite().is_some() {
                continue;
            }
            let index = layer.index();
            let name = layer.name();
            let layer = Arc::clone(layer);
            let input = Arc::clone(&input);
            let task = tokio::spawn(async move { execute(layer.as_ref(), &input) });
            running.push((index, name, task));
        }
        for (index, name, task) in running {
            let result = match task.await {
                Ok(result) => result,
                // A panicked layer task is a failed evaluation, never a
                // missing report entry.
                Err(e) => {
                    tracing::error!(
                        node = %input.node_id,
                        layer = index,
                        error = %e,
                        "Layer task failed"
                    );
                    LayerResult {
                        layer_index: index,
                        layer_name: name.to_string(),
                        verdict: Verdict::Fail,
                        severity: Severity::Fatal,
                        detail: "layer error: task panicked".to_string(),
                    }
                }
            };
            results.insert(index, result);
        }

        // Phase 3: prerequisite-bearing layers, in order, after their
        // prerequisites have results.
        for layer in self.battery_layers() {
            let Some(pre) = layer.prerequisite() else {
                continue;
            };
            let pre_passed = results
                .get(&pre)
                .map(|r| r.verdict == Verdict::Pass)
                .unwrap_or(false);
            let result = if pre_passed {
                execute(layer.as_ref(), &input)
            } else {
                skipped(layer.as_ref(), &format!("prerequisite layer {pre} did not pass"))
            };
            results.insert(layer.index(), result);
        }

        self.finish(node, results)
    }

    fn structural_layers(&self) -> impl Iterator<Item = &Arc<dyn CheckLayer>> {
        self.layers.iter().filter(|l| l.index() <= STRUCTURAL_PHASE_END)
    }

    fn battery_layers(&self) -> impl Iterator<Item = &Arc<dyn CheckLayer>> {
        self.layers.iter().filter(|l| l.index() > STRUCTURAL_PHASE_END)
    }

    fn finish(&self, node: &mut Node, results: BTreeMap<u8, LayerResult>) -> ValidationReport {
        let report = ValidationReport::finalize(results.into_values().collect());
        tracing::info!(
            node = %node.id,
            verdict = ?report.overall_verdict,
            score = report.quality_score,
            "Validation complete"
        );
        node.push_report(report.clone());
        report
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

fn execute(layer: &dyn CheckLayer, input: &LayerInput) -> LayerResult {
    match layer.check(input) {
        Ok(LayerOutcome { verdict, detail }) => LayerResult {
            layer_index: layer.index(),
            layer_name: layer.name().to_string(),
            verdict,
            severity: layer.severity(),
            detail,
        },
        // A layer that cannot evaluate never passes silently.
        Err(e) => LayerResult {
            layer_index: layer.index(),
            layer_name: layer.name().to_string(),
            verdict: Verdict::Fail,
            severity: Severity::Fatal,
            detail: format!("layer error: {e}"),
        },
    }
}

fn skipped(layer: &dyn CheckLayer, detail: &str) -> LayerResult {
    LayerResult {
        layer_index: layer.index(),
        layer_name: layer.name().to_string(),
        verdict: Verdict::Skipped,
        severity: layer.severity(),
        detail: detail.to_string(),
    }
}
