//! Generation sources: the per-tier backends behind the router.

use std::time::Duration;

use async_trait::async_trait;

use sentinel_kb::KbStore;
use sentinel_types::{Node, SourceTier};

/// What one tier produced for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The tier produced candidate code.
    Served(String),
    /// The tier cannot handle this node; the reason lands in the
    /// fallback trail.
    Declined(String),
}

/// Default per-tier deadline. The rule engine has none: it must answer.
pub fn default_deadline(tier: SourceTier) -> Option<Duration> {
    match tier {
        SourceTier::Inline => Some(Duration::from_secs(2)),
        SourceTier::LocalModel => Some(Duration::from_secs(30)),
        SourceTier::CloudApi => Some(Duration::from_secs(60)),
        SourceTier::RuleEngine => None,
    }
}

/// One candidate-generation backend.
///
/// `generate` either serves or declines; it never errors. Exceeding the
/// deadline is handled by the router, which cancels the future and records
/// a timeout miss.
#[async_trait]
pub trait GenerationSource: Send + Sync {
    fn tier(&self) -> SourceTier;

    fn deadline(&self) -> Option<Duration> {
        default_deadline(self.tier())
    }

    async fn generate(&self, node: &Node) -> SourceOutcome;
}

// ---------------------------------------------------------------------------
// Tier 1: inline heuristic generator
// ---------------------------------------------------------------------------

/// Synthesizes a function skeleton directly from the node's spec. Fast and
/// deterministic, but only applicable when the spec declares a signature.
pub struct InlineSource;

impl InlineSource {
    fn synthesize(node: &Node) -> String {
        let name = function_name(&node.id);
        let params = node
            .spec
            .inputs
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let return_hint = node
            .spec
            .outputs
            .first()
            .map(|p| format!(" -> {}", p.ty))
            .unwrap_or_default();
        let body = if node.spec.outputs.is_empty() {
            "        pass_through()".to_string()
        } else {
            "        result = compute()\n        return result".to_string()
        };
        format!(
            "def {name}({params}){return_hint}:\n    \"\"\"{description}\"\"\"\n    try:\n{body}\n    except Exception as exc:\n        raise ValueError(str(exc))",
            description = node.description,
        )
    }
}

#[async_trait]
impl GenerationSource for InlineSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Inline
    }

    async fn generate(&self, node: &Node) -> SourceOutcome {
        if node.spec.inputs.is_empty() && node.spec.outputs.is_empty() {
            return SourceOutcome::Declined("spec declares no signature to synthesize".into());
        }
        SourceOutcome::Served(Self::synthesize(node))
    }
}

// ---------------------------------------------------------------------------
// Tiers 2 and 3: model backends
// ---------------------------------------------------------------------------

/// Stand-in for a model tier with no backend wired up. Declines every node,
/// which keeps the standard router total without a running model.
pub struct UnconfiguredBackend {
    tier: SourceTier,
}

impl UnconfiguredBackend {
    pub fn new(tier: SourceTier) -> Self {
        Self { tier }
    }
}

#[async_trait]
impl GenerationSource for UnconfiguredBackend {
    fn tier(&self) -> SourceTier {
        self.tier
    }

    async fn generate(&self, _node: &Node) -> SourceOutcome {
        SourceOutcome::Declined(format!("{} backend not configured", self.tier))
    }
}

// ---------------------------------------------------------------------------
// Tier 4: rule engine over the knowledge base
// ---------------------------------------------------------------------------

/// The total tier. Looks the node up in the knowledge base and instantiates
/// the matched template; with no match it degrades to a generic skeleton.
/// Never declines, never exceeds a deadline (it has none).
pub struct RuleEngineSource {
    kb: KbStore,
}

impl RuleEngineSource {
    pub fn new(kb: KbStore) -> Self {
        Self { kb }
    }

    fn instantiate(template: &str, node: &Node) -> String {
        template
            .replace("{node_id}", &node.id)
            .replace("{description}", &node.description)
    }

    fn generic_skeleton(node: &Node) -> String {
        let name = function_name(&node.id);
        format!(
            "def {name}():\n    \"\"\"{description}\"\"\"\n    try:\n        pass_through()\n    except Exception as exc:\n        raise ValueError(str(exc))",
            description = node.description,
        )
    }
}

#[async_trait]
impl GenerationSource for RuleEngineSource {
    fn tier(&self) -> SourceTier {
        SourceTier::RuleEngine
    }

    async fn generate(&self, node: &Node) -> SourceOutcome {
        match self.kb.lookup(&node.searchable_text()) {
            Some(record) => {
                tracing::debug!(
                    node = %node.id,
                    risk_category = %record.risk_category,
                    "Rule engine matched a knowledge base record"
                );
                SourceOutcome::Served(Self::instantiate(&record.template, node))
            }
            None => SourceOutcome::Served(Self::generic_skeleton(node)),
        }
    }
}

/// Node ids are free-form; function names are not.
fn function_name(node_id: &str) -> String {
    let name: String = node_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("n_{name}")
    } else if name.is_empty() {
        "handle".to_string()
    } else {
        name
    }
}
