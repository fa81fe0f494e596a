//! The fallback router: one attempt per tier, strictly descending priority.

use std::sync::Arc;
use std::time::Instant;

use sentinel_kb::KbStore;
use sentinel_types::{Candidate, GateError, MissReason, Node, Result, SourceTier, TierMiss};

use crate::source::{
    GenerationSource, InlineSource, RuleEngineSource, SourceOutcome, UnconfiguredBackend,
};

/// Walks the tiers in order, returning the first served candidate.
///
/// Each tier gets exactly one attempt under its own deadline; there is no
/// retry within a tier and no falling back upwards. Every miss is recorded
/// in the candidate's fallback trail. The standard battery ends in the rule
/// engine, which always serves, so `generate` only errors on a custom
/// battery that exhausts.
pub struct GenerationRouter {
    sources: Vec<Arc<dyn GenerationSource>>,
}

impl GenerationRouter {
    pub fn new(sources: Vec<Arc<dyn GenerationSource>>) -> Self {
        Self { sources }
    }

    /// The standard four-tier battery over the given knowledge base. The
    /// model tiers ship unconfigured and decline until a backend is wired in.
    pub fn standard(kb: KbStore) -> Self {
        Self::new(vec![
            Arc::new(InlineSource),
            Arc::new(UnconfiguredBackend::new(SourceTier::LocalModel)),
            Arc::new(UnconfiguredBackend::new(SourceTier::CloudApi)),
            Arc::new(RuleEngineSource::new(kb)),
        ])
    }

    pub async fn generate(&self, node: &Node) -> Result<Candidate> {
        let started = Instant::now();
        let mut trail: Vec<TierMiss> = Vec::new();

        for source in &self.sources {
            let tier = source.tier();
            let outcome = match source.deadline() {
                Some(deadline) => {
                    match tokio::time::timeout(deadline, source.generate(node)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            let deadline_ms = deadline.as_millis() as u64;
                            tracing::warn!(node = %node.id, %tier, deadline_ms, "Tier timed out");
                            trail.push(TierMiss {
                                tier,
                                reason: MissReason::Timeout { deadline_ms },
                            });
                            continue;
                        }
                    }
                }
                None => source.generate(node).await,
            };

            match outcome {
                SourceOutcome::Served(content) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    tracing::info!(
                        node = %node.id,
                        %tier,
                        latency_ms,
                        misses = trail.len(),
                        "Candidate served"
                    );
                    return Ok(Candidate::served(tier, content, latency_ms, trail));
                }
                SourceOutcome::Declined(reason) => {
                    tracing::debug!(node = %node.id, %tier, %reason, "Tier declined");
                    trail.push(TierMiss {
                        tier,
                        reason: MissReason::Declined(reason),
                    });
                }
            }
        }

        Err(GateError::Other(format!(
            "no generation source produced a candidate for node '{}'",
            node.id
        )))
    }
}
