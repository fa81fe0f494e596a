//! Generation candidate types — code text plus its fallback provenance.

use serde::{Deserialize, Serialize};

/// One candidate-generation source in the router's fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Tier 1: fast local heuristic generator.
    Inline,
    /// Tier 2: local model backend.
    LocalModel,
    /// Tier 3: cloud API with caller-supplied credential.
    CloudApi,
    /// Tier 4: rule engine over the knowledge base. Never misses.
    RuleEngine,
}

impl SourceTier {
    pub fn index(&self) -> u8 {
        match self {
            SourceTier::Inline => 1,
            SourceTier::LocalModel => 2,
            SourceTier::CloudApi => 3,
            SourceTier::RuleEngine => 4,
        }
    }
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceTier::Inline => "inline",
            SourceTier::LocalModel => "local_model",
            SourceTier::CloudApi => "cloud_api",
            SourceTier::RuleEngine => "rule_engine",
        };
        write!(f, "{name}")
    }
}

/// Why a tier failed to produce a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The tier declined: not applicable to this node.
    Declined(String),
    /// The tier exceeded its deadline and was cancelled.
    Timeout { deadline_ms: u64 },
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissReason::Declined(reason) => write!(f, "declined: {reason}"),
            MissReason::Timeout { deadline_ms } => {
                write!(f, "timed out after {deadline_ms}ms")
            }
        }
    }
}

/// One failed tier attempt, kept for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMiss {
    pub tier: SourceTier,
    pub reason: MissReason,
}

/// Code text plus its provenance. Advisory metadata only — the validation
/// pipeline never reads provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub source_tier: SourceTier,
    pub content: String,
    /// Wall-clock time spent across all attempted tiers.
    pub latency_ms: u64,
    /// Absent on success; a returned candidate always came from a tier that
    /// served it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss_reason: Option<MissReason>,
    /// Misses and timeouts of the tiers tried before the serving one.
    #[serde(default)]
    pub fallback_trail: Vec<TierMiss>,
}

impl Candidate {
    pub fn served(
        source_tier: SourceTier,
        content: impl Into<String>,
        latency_ms: u64,
        fallback_trail: Vec<TierMiss>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_tier,
            content: content.into(),
            latency_ms,
            miss_reason: None,
            fallback_trail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_indices_are_ordered() {
        assert_eq!(SourceTier::Inline.index(), 1);
        assert_eq!(SourceTier::LocalModel.index(), 2);
        assert_eq!(SourceTier::CloudApi.index(), 3);
        assert_eq!(SourceTier::RuleEngine.index(), 4);
        assert!(SourceTier::Inline < SourceTier::RuleEngine);
    }

    #[test]
    fn tier_display_names() {
        assert_eq!(SourceTier::Inline.to_string(), "inline");
        assert_eq!(SourceTier::RuleEngine.to_string(), "rule_engine");
    }

    #[test]
    fn miss_reason_display() {
        let declined = MissReason::Declined("no signature to synthesize".into());
        assert_eq!(declined.to_string(), "declined: no signature to synthesize");
        let timeout = MissReason::Timeout { deadline_ms: 2000 };
        assert_eq!(timeout.to_string(), "timed out after 2000ms");
    }

    #[test]
    fn served_candidate_has_no_miss_reason() {
        let candidate = Candidate::served(
            SourceTier::RuleEngine,
            "fn handle() {}",
            42,
            vec![TierMiss {
                tier: SourceTier::Inline,
                reason: MissReason::Declined("not applicable".into()),
            }],
        );
        assert!(candidate.miss_reason.is_none());
        assert_eq!(candidate.fallback_trail.len(), 1);
        assert_eq!(candidate.source_tier, SourceTier::RuleEngine);
    }

    #[test]
    fn candidate_serialization_omits_absent_miss_reason() {
        let candidate = Candidate::served(SourceTier::Inline, "code", 1, vec![]);
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(!json.contains("miss_reason"));
        let back: Candidate = serde_json::from_str(&json).unwrap();
        assert!(back.miss_reason.is_none());
    }
}
