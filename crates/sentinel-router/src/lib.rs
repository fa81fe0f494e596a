//! Tiered fallback generation: Inline -> LocalModel -> CloudApi -> RuleEngine.
//!
//! The router walks a fixed priority order of [`GenerationSource`]s, giving
//! each one attempt under a per-tier deadline. A miss or timeout moves on to
//! the next tier, never back; the rule-engine tier is total, so a standard
//! router always produces a candidate.

mod router;
mod source;

pub use router::GenerationRouter;
pub use source::{
    default_deadline, GenerationSource, InlineSource, RuleEngineSource, SourceOutcome,
    UnconfiguredBackend,
};
