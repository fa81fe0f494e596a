//! The interview engine: `assess` and `record_answer`.

use sentinel_types::{GateError, Node, Result};

use crate::library::QuestionLibrary;
use crate::question::Question;

/// Result of one readiness assessment.
#[derive(Debug, Clone, PartialEq)]
pub enum InterviewOutcome {
    /// No required question remains unanswered; generation may proceed.
    Cleared,
    /// At least one required high-risk question is open.
    NotCleared { next_question: Question },
}

/// Evaluates nodes against the static question library. Stateless: two
/// engines over the same library are interchangeable, and a node's clearing
/// is re-derived on every call.
pub struct InterviewEngine {
    library: QuestionLibrary,
}

impl InterviewEngine {
    pub fn new(library: QuestionLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &QuestionLibrary {
        &self.library
    }

    /// Decide whether the node is logically complete enough to generate code.
    ///
    /// Among required questions whose trigger matches the node's text and
    /// that have no recorded answer, returns the one with the
    /// highest-priority category; ties broken by lowest id. Returns
    /// `Cleared` when none remain.
    pub fn assess(&self, node: &Node) -> InterviewOutcome {
        let text = node.searchable_text();
        let next = self
            .library
            .all()
            .iter()
            .filter(|q| q.required)
            .filter(|q| q.trigger.matches(&text))
            .filter(|q| !node.answers().contains_key(&q.id))
            .min_by(|a, b| {
                a.category
                    .priority()
                    .cmp(&b.category.priority())
                    .then_with(|| a.id.cmp(&b.id))
            });

        match next {
            Some(question) => {
                tracing::info!(
                    node = %node.id,
                    question = %question.id,
                    category = ?question.category,
                    "Interview not cleared"
                );
                InterviewOutcome::NotCleared {
                    next_question: question.clone(),
                }
            }
            None => {
                tracing::info!(node = %node.id, "Interview cleared");
                InterviewOutcome::Cleared
            }
        }
    }

    /// All matched, unanswered questions (required and advisory), for
    /// presenting the full open set to a caller.
    pub fn open_questions<'a>(&'a self, node: &Node) -> Vec<&'a Question> {
        let text = node.searchable_text();
        let mut open: Vec<&Question> = self
            .library
            .all()
            .iter()
            .filter(|q| q.trigger.matches(&text))
            .filter(|q| !node.answers().contains_key(&q.id))
            .collect();
        open.sort_by(|a, b| {
            a.category
                .priority()
                .cmp(&b.category.priority())
                .then_with(|| a.id.cmp(&b.id))
        });
        open
    }

    /// Record an answer. Overwrite-idempotent. Fails with `UnknownQuestion`
    /// (and no state change) when the id is outside the fixed library.
    pub fn record_answer(
        &self,
        node: &mut Node,
        question_id: &str,
        answer: impl Into<String>,
    ) -> Result<()> {
        if !self.library.contains(question_id) {
            return Err(GateError::UnknownQuestion {
                question_id: question_id.to_string(),
            });
        }
        node.insert_answer(question_id, answer);
        Ok(())
    }
}

impl Default for InterviewEngine {
    fn default() -> Self {
        Self::new(QuestionLibrary::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::{Node, NodeSpec, ParamSpec};

    fn node_with_description(description: &str) -> Node {
        Node::new("n1", description, NodeSpec::default())
    }

    #[test]
    fn concurrent_orders_asks_q_conc_01() {
        let engine = InterviewEngine::default();
        let node = node_with_description("a service that processes concurrent orders");
        match engine.assess(&node) {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-CONC-01");
            }
            other => panic!("expected NotCleared, got: {other:?}"),
        }
    }

    #[test]
    fn harmless_description_clears_immediately() {
        let engine = InterviewEngine::default();
        let node = node_with_description("render a static html page");
        assert_eq!(engine.assess(&node), InterviewOutcome::Cleared);
    }

    #[test]
    fn data_integrity_outranks_concurrency() {
        let engine = InterviewEngine::default();
        // Matches both Q-DATA-01 (cache) and Q-CONC-01 (concurrent).
        let node = node_with_description("concurrent cache invalidation");
        match engine.assess(&node) {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-DATA-01");
            }
            other => panic!("expected NotCleared, got: {other:?}"),
        }
    }

    #[test]
    fn answering_advances_to_next_question_then_clears() {
        let engine = InterviewEngine::default();
        // "payment timeout" matches Q-FAIL-01 (failure-handling) and
        // Q-RECV-01 (recovery; "payment" keyword). Failure-handling first.
        let mut node = node_with_description("payment timeout handling");
        match engine.assess(&node) {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-FAIL-01");
            }
            other => panic!("expected NotCleared, got: {other:?}"),
        }
        engine
            .record_answer(&mut node, "Q-FAIL-01", "status_query")
            .unwrap();
        match engine.assess(&node) {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-RECV-01");
            }
            other => panic!("expected NotCleared, got: {other:?}"),
        }
        engine
            .record_answer(&mut node, "Q-RECV-01", "retry_order")
            .unwrap();
        assert_eq!(engine.assess(&node), InterviewOutcome::Cleared);
    }

    #[test]
    fn unknown_question_is_rejected_without_state_change() {
        let engine = InterviewEngine::default();
        let mut node = node_with_description("payment flow");
        let err = engine
            .record_answer(&mut node, "Q-NOPE-99", "whatever")
            .unwrap_err();
        match err {
            GateError::UnknownQuestion { question_id } => {
                assert_eq!(question_id, "Q-NOPE-99");
            }
            other => panic!("expected UnknownQuestion, got: {other:?}"),
        }
        assert!(node.answers().is_empty());
    }

    #[test]
    fn reanswering_overwrites() {
        let engine = InterviewEngine::default();
        let mut node = node_with_description("login form");
        engine.record_answer(&mut node, "Q-SEC-01", "lockout").unwrap();
        engine.record_answer(&mut node, "Q-SEC-01", "captcha").unwrap();
        assert_eq!(node.answers()["Q-SEC-01"].value, "captcha");
    }

    #[test]
    fn spec_mutation_reopens_a_cleared_interview() {
        let engine = InterviewEngine::default();
        let mut node = node_with_description("a static report renderer");
        assert_eq!(engine.assess(&node), InterviewOutcome::Cleared);

        // A new spec field introduces a concurrency trigger; no cached flag
        // keeps the node cleared.
        node.spec.inputs.push(ParamSpec {
            name: "concurrent_workers".into(),
            ty: "u32".into(),
        });
        match engine.assess(&node) {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-CONC-01");
            }
            other => panic!("expected NotCleared after spec mutation, got: {other:?}"),
        }
    }

    #[test]
    fn advisory_questions_do_not_block_but_are_listed() {
        let engine = InterviewEngine::default();
        // "search" matches only the non-required Q-PERF-01.
        let node = node_with_description("full text search endpoint");
        assert_eq!(engine.assess(&node), InterviewOutcome::Cleared);
        let open = engine.open_questions(&node);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "Q-PERF-01");
    }

    #[test]
    fn assessment_is_pure_and_repeatable() {
        let engine = InterviewEngine::default();
        let node = node_with_description("concurrent order intake");
        let first = engine.assess(&node);
        let second = engine.assess(&node);
        assert_eq!(first, second);
    }
}
