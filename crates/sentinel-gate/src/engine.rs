//! Engine orchestration over the node registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};

use sentinel_interview::{InterviewEngine, InterviewOutcome};
use sentinel_kb::KbStore;
use sentinel_router::GenerationRouter;
use sentinel_types::{
    Candidate, GateColor, GateError, GateEvent, Node, NodeStatus, Result, ValidationReport,
};
use sentinel_validate::ValidationPipeline;

use crate::events::{GateNotification, NotificationBus};

/// Registry plus orchestration. One engine owns all nodes of a project.
///
/// Every node sits behind its own mutex; an operation that finds the node
/// already locked fails fast with `NodeBusy` rather than queueing, so two
/// concurrent submissions against one node cannot interleave. Operations on
/// different nodes proceed independently.
pub struct GateEngine {
    nodes: RwLock<BTreeMap<String, Arc<Mutex<Node>>>>,
    interview: InterviewEngine,
    pipeline: ValidationPipeline,
    router: GenerationRouter,
    bus: NotificationBus,
}

impl GateEngine {
    /// Engine with the standard interview library, validation battery, and
    /// four-tier router over the given knowledge base.
    pub fn new(kb: KbStore) -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            interview: InterviewEngine::default(),
            pipeline: ValidationPipeline::standard(),
            router: GenerationRouter::standard(kb),
            bus: NotificationBus::default(),
        }
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.bus
    }

    // ---- registry ----

    pub async fn register(&self, node: Node) -> Result<()> {
        // Gate soundness holds for externally sourced nodes too: a session
        // file claiming IMPLEMENTED must carry the passing report to prove it.
        if node.status() == NodeStatus::Implemented
            && !node.last_report().map(|r| r.passed()).unwrap_or(false)
        {
            return Err(GateError::Other(format!(
                "node '{}' is IMPLEMENTED without a passing validation report",
                node.id
            )));
        }
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(&node.id) {
            return Err(GateError::Other(format!(
                "node '{}' is already registered",
                node.id
            )));
        }
        tracing::info!(node = %node.id, status = ?node.status(), "Node registered");
        self.bus.emit(GateNotification::NodeRegistered {
            node_id: node.id.clone(),
            status: format!("{:?}", node.status()),
        });
        nodes.insert(node.id.clone(), Arc::new(Mutex::new(node)));
        Ok(())
    }

    /// Registered node ids, in lexical order.
    pub async fn node_ids(&self) -> Vec<String> {
        self.nodes.read().await.keys().cloned().collect()
    }

    pub async fn node_status(&self, id: &str) -> Result<NodeStatus> {
        let handle = self.handle(id).await?;
        let node = try_lock(id, &handle)?;
        Ok(node.status())
    }

    /// Traffic-light projection, derived from the status on every call and
    /// never stored.
    pub async fn node_color(&self, id: &str) -> Result<GateColor> {
        Ok(self.node_status(id).await?.color())
    }

    /// A point-in-time copy for display. Holding it confers no rights: all
    /// mutation goes back through the engine.
    pub async fn snapshot(&self, id: &str) -> Result<Node> {
        let handle = self.handle(id).await?;
        let node = try_lock(id, &handle)?;
        Ok(node.clone())
    }

    // ---- lifecycle operations ----

    /// Try to unlock a `Locked` node. With unmet dependencies the node stays
    /// `Locked` and that status is re-reported rather than treated as a
    /// failure; the refusal lands on the notification bus.
    pub async fn resolve_dependencies(&self, id: &str) -> Result<NodeStatus> {
        let unmet = self.unmet_dependencies(id).await?;
        let handle = self.handle(id).await?;
        let mut node = try_lock(id, &handle)?;
        match node.advance(GateEvent::DependenciesResolved, &unmet) {
            Ok(status) => {
                self.bus.emit(GateNotification::NodeUnlocked {
                    node_id: id.to_string(),
                });
                Ok(status)
            }
            Err(GateError::DependencyUnmet { blocked_on, .. }) => {
                self.bus.emit(GateNotification::UnlockRefused {
                    node_id: id.to_string(),
                    blocked_on,
                });
                Ok(NodeStatus::Locked)
            }
            Err(e) => Err(e),
        }
    }

    /// Run the readiness interview. An `Idle` node is moved to `Planning`
    /// first; a cleared interview moves it on to `Coding`.
    pub async fn assess_requirement(&self, id: &str) -> Result<InterviewOutcome> {
        let handle = self.handle(id).await?;
        let mut node = try_lock(id, &handle)?;
        if node.status() == NodeStatus::Idle {
            node.advance(GateEvent::BeginPlanning, &[])?;
        }
        if node.status() != NodeStatus::Planning {
            return Err(GateError::InvalidTransition {
                from: node.status(),
                event: GateEvent::BeginPlanning,
            });
        }
        let outcome = self.interview.assess(&node);
        self.emit_outcome(id, &outcome);
        if outcome == InterviewOutcome::Cleared {
            node.advance(GateEvent::InterviewCleared, &[])?;
        }
        Ok(outcome)
    }

    /// Record an interview answer and re-assess. Recording is
    /// overwrite-idempotent; the node advances to `Coding` only when it is
    /// `Planning` and the re-assessment clears.
    pub async fn submit_answer(
        &self,
        id: &str,
        question_id: &str,
        answer: &str,
    ) -> Result<InterviewOutcome> {
        let handle = self.handle(id).await?;
        let mut node = try_lock(id, &handle)?;
        self.interview.record_answer(&mut node, question_id, answer)?;
        self.bus.emit(GateNotification::AnswerRecorded {
            node_id: id.to_string(),
            question_id: question_id.to_string(),
        });
        let outcome = self.interview.assess(&node);
        if node.status() == NodeStatus::Planning {
            self.emit_outcome(id, &outcome);
            if outcome == InterviewOutcome::Cleared {
                node.advance(GateEvent::InterviewCleared, &[])?;
            }
        }
        Ok(outcome)
    }

    /// Route a generation request through the fallback tiers. Only legal
    /// while the node is `Coding`; the node itself is not mutated — the
    /// candidate comes back to the caller, who submits it for validation.
    pub async fn request_generation(&self, id: &str) -> Result<Candidate> {
        let snapshot = {
            let handle = self.handle(id).await?;
            let node = try_lock(id, &handle)?;
            if node.status() != NodeStatus::Coding {
                return Err(GateError::InvalidTransition {
                    from: node.status(),
                    event: GateEvent::CandidateSubmitted,
                });
            }
            node.clone()
        };
        let candidate = self.router.generate(&snapshot).await?;
        self.bus.emit(GateNotification::CandidateServed {
            node_id: id.to_string(),
            tier: candidate.source_tier,
            latency_ms: candidate.latency_ms,
        });
        Ok(candidate)
    }

    /// Submit candidate code and run the full validation battery. A passing
    /// report moves the node to `Implemented`; a failing one sends it back
    /// to `Coding` for revision. The report is appended to the node's
    /// history either way.
    pub async fn validate_candidate(&self, id: &str, code: &str) -> Result<ValidationReport> {
        let handle = self.handle(id).await?;
        let mut node = try_lock(id, &handle)?;
        node.advance(GateEvent::CandidateSubmitted, &[])?;
        let report = self.pipeline.run(code, &mut node).await;
        self.bus.emit(GateNotification::ValidationCompleted {
            node_id: id.to_string(),
            verdict: report.overall_verdict,
            quality_score: report.quality_score,
        });
        if report.passed() {
            node.advance(GateEvent::ValidationPassed, &[])?;
            self.bus.emit(GateNotification::NodeImplemented {
                node_id: id.to_string(),
            });
        } else {
            node.advance(GateEvent::ValidationFailed, &[])?;
            self.bus.emit(GateNotification::RevisionRequested {
                node_id: id.to_string(),
            });
        }
        Ok(report)
    }

    // ---- dependency graph ----

    /// Reject registries whose dependency edges form a cycle. Reports the
    /// first cycle found, with its members in path order. Edges pointing at
    /// unregistered ids are ignored here; they surface as unmet
    /// dependencies at unlock time instead.
    pub async fn check_cycles(&self) -> Result<()> {
        let graph = self.dependency_graph().await?;
        // 0 = unvisited, 1 = on the current path, 2 = done.
        let mut state: BTreeMap<String, u8> = graph.keys().map(|k| (k.clone(), 0)).collect();

        for start in graph.keys() {
            if state[start] != 0 {
                continue;
            }
            let mut stack: Vec<(String, usize)> = vec![(start.clone(), 0)];
            state.insert(start.clone(), 1);
            while let Some((current, next_edge)) = stack.last().cloned() {
                let deps = &graph[&current];
                if next_edge < deps.len() {
                    if let Some(frame) = stack.last_mut() {
                        frame.1 += 1;
                    }
                    let dep = &deps[next_edge];
                    match state.get(dep).copied() {
                        Some(0) => {
                            state.insert(dep.clone(), 1);
                            stack.push((dep.clone(), 0));
                        }
                        Some(1) => {
                            let pos = stack
                                .iter()
                                .position(|(n, _)| n == dep)
                                .unwrap_or(0);
                            let members: Vec<String> =
                                stack[pos..].iter().map(|(n, _)| n.clone()).collect();
                            tracing::error!(?members, "Dependency cycle detected");
                            return Err(GateError::DependencyCycle { members });
                        }
                        _ => {}
                    }
                } else {
                    state.insert(current.clone(), 2);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    // ---- internals ----

    async fn handle(&self, id: &str) -> Result<Arc<Mutex<Node>>> {
        self.nodes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GateError::UnknownNode {
                node_id: id.to_string(),
            })
    }

    /// Dependency ids of `id` whose nodes are missing or not `Implemented`.
    async fn unmet_dependencies(&self, id: &str) -> Result<Vec<String>> {
        let deps: Vec<String> = {
            let handle = self.handle(id).await?;
            let node = try_lock(id, &handle)?;
            node.upstream_dependencies.iter().cloned().collect()
        };
        let mut unmet = Vec::new();
        for dep in deps {
            let met = match self.nodes.read().await.get(&dep).cloned() {
                Some(dep_handle) => {
                    try_lock(&dep, &dep_handle)?.status() == NodeStatus::Implemented
                }
                None => false,
            };
            if !met {
                unmet.push(dep);
            }
        }
        Ok(unmet)
    }

    async fn dependency_graph(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let nodes = self.nodes.read().await;
        let mut graph = BTreeMap::new();
        for (id, handle) in nodes.iter() {
            let node = try_lock(id, handle)?;
            graph.insert(id.clone(), node.upstream_dependencies.iter().cloned().collect());
        }
        Ok(graph)
    }

    fn emit_outcome(&self, id: &str, outcome: &InterviewOutcome) {
        match outcome {
            InterviewOutcome::Cleared => self.bus.emit(GateNotification::InterviewCleared {
                node_id: id.to_string(),
            }),
            InterviewOutcome::NotCleared { next_question } => {
                self.bus.emit(GateNotification::QuestionPosed {
                    node_id: id.to_string(),
                    question_id: next_question.id.clone(),
                })
            }
        }
    }
}

fn try_lock<'a>(id: &str, handle: &'a Arc<Mutex<Node>>) -> Result<MutexGuard<'a, Node>> {
    handle.try_lock().map_err(|_| GateError::NodeBusy {
        node_id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use sentinel_types::{NodeSpec, ParamSpec};

    fn signature_spec() -> NodeSpec {
        let mut spec = NodeSpec::default();
        spec.inputs.push(ParamSpec {
            name: "item_id".into(),
            ty: "str".into(),
        });
        spec.outputs.push(ParamSpec {
            name: "result".into(),
            ty: "dict".into(),
        });
        spec
    }

    fn deps(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// Answer open questions until cleared, generate, validate.
    async fn drive_to_implemented(engine: &GateEngine, id: &str) {
        let mut outcome = engine.assess_requirement(id).await.unwrap();
        while let InterviewOutcome::NotCleared { next_question } = outcome {
            outcome = engine
                .submit_answer(id, &next_question.id, "handled explicitly")
                .await
                .unwrap();
        }
        let candidate = engine.request_generation(id).await.unwrap();
        let report = engine.validate_candidate(id, &candidate.content).await.unwrap();
        assert!(report.passed(), "suggestions: {:?}", report.suggestions);
    }

    #[tokio::test]
    async fn full_gate_flow_reaches_implemented_and_green() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new(
                "orders",
                "process concurrent orders",
                signature_spec(),
            ))
            .await
            .unwrap();
        assert_eq!(engine.node_color("orders").await.unwrap(), GateColor::Red);

        drive_to_implemented(&engine, "orders").await;

        assert_eq!(
            engine.node_status("orders").await.unwrap(),
            NodeStatus::Implemented
        );
        assert_eq!(engine.node_color("orders").await.unwrap(), GateColor::Green);
    }

    #[tokio::test]
    async fn interview_blocks_until_answered() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new(
                "orders",
                "process concurrent orders",
                signature_spec(),
            ))
            .await
            .unwrap();

        match engine.assess_requirement("orders").await.unwrap() {
            InterviewOutcome::NotCleared { next_question } => {
                assert_eq!(next_question.id, "Q-CONC-01");
            }
            other => panic!("expected NotCleared, got: {other:?}"),
        }
        // Still Planning: generation is refused before the interview clears.
        assert_eq!(
            engine.node_status("orders").await.unwrap(),
            NodeStatus::Planning
        );
        assert!(matches!(
            engine.request_generation("orders").await.unwrap_err(),
            GateError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn locked_node_re_reports_locked_until_dependencies_implement() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new("cart", "render a cart page", signature_spec()))
            .await
            .unwrap();
        engine
            .register(Node::with_dependencies(
                "checkout",
                "render a checkout page",
                signature_spec(),
                deps(&["cart"]),
            ))
            .await
            .unwrap();

        // Re-reported Locked, not an error.
        assert_eq!(
            engine.resolve_dependencies("checkout").await.unwrap(),
            NodeStatus::Locked
        );

        drive_to_implemented(&engine, "cart").await;
        assert_eq!(
            engine.resolve_dependencies("checkout").await.unwrap(),
            NodeStatus::Idle
        );
    }

    #[tokio::test]
    async fn failed_validation_returns_to_coding_and_allows_revision() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new("pages", "render a static page", signature_spec()))
            .await
            .unwrap();
        let mut outcome = engine.assess_requirement("pages").await.unwrap();
        while let InterviewOutcome::NotCleared { next_question } = outcome {
            outcome = engine
                .submit_answer("pages", &next_question.id, "handled")
                .await
                .unwrap();
        }

        let report = engine
            .validate_candidate("pages", "def broken(:\n    return (")
            .await
            .unwrap();
        assert!(!report.passed());
        assert_eq!(
            engine.node_status("pages").await.unwrap(),
            NodeStatus::Coding
        );
        assert_eq!(engine.node_color("pages").await.unwrap(), GateColor::Orange);

        // Revision: a served candidate passes on resubmission.
        let candidate = engine.request_generation("pages").await.unwrap();
        let report = engine
            .validate_candidate("pages", &candidate.content)
            .await
            .unwrap();
        assert!(report.passed());
        assert_eq!(
            engine.node_status("pages").await.unwrap(),
            NodeStatus::Implemented
        );
        // Both reports survive in the history.
        assert_eq!(
            engine.snapshot("pages").await.unwrap().validation_history().len(),
            2
        );
    }

    #[tokio::test]
    async fn busy_node_fails_fast() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new("orders", "process orders", signature_spec()))
            .await
            .unwrap();

        let handle = engine.nodes.read().await.get("orders").cloned().unwrap();
        let _guard = handle.try_lock().unwrap();

        match engine.node_status("orders").await.unwrap_err() {
            GateError::NodeBusy { node_id } => assert_eq!(node_id, "orders"),
            other => panic!("expected NodeBusy, got: {other:?}"),
        }
        assert!(engine.assess_requirement("orders").await.is_err());
    }

    #[tokio::test]
    async fn unknown_node_is_reported() {
        let engine = GateEngine::new(KbStore::default());
        assert!(matches!(
            engine.node_status("ghost").await.unwrap_err(),
            GateError::UnknownNode { .. }
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let engine = GateEngine::new(KbStore::default());
        let node = Node::new("orders", "process orders", NodeSpec::default());
        engine.register(node.clone()).await.unwrap();
        assert!(engine.register(node).await.is_err());
    }

    #[tokio::test]
    async fn forged_implemented_status_is_rejected_at_registration() {
        // A hand-edited session file can claim any status; without the
        // passing report to back it, IMPLEMENTED does not get in.
        let node = Node::new("orders", "process orders", NodeSpec::default());
        let mut value = serde_json::to_value(&node).unwrap();
        value["status"] = serde_json::Value::String("IMPLEMENTED".into());
        let forged: Node = serde_json::from_value(value).unwrap();
        assert_eq!(forged.status(), NodeStatus::Implemented);
        assert!(forged.validation_history().is_empty());

        let engine = GateEngine::new(KbStore::default());
        match engine.register(forged).await.unwrap_err() {
            GateError::Other(message) => {
                assert!(message.contains("without a passing validation report"));
            }
            other => panic!("expected registration to be refused, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn genuinely_implemented_node_reregisters_cleanly() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new("pages", "render a static page", signature_spec()))
            .await
            .unwrap();
        drive_to_implemented(&engine, "pages").await;
        let snapshot = engine.snapshot("pages").await.unwrap();

        // A session reload registers the same node into a fresh engine.
        let restored = GateEngine::new(KbStore::default());
        restored.register(snapshot).await.unwrap();
        assert_eq!(
            restored.node_status("pages").await.unwrap(),
            NodeStatus::Implemented
        );
    }

    #[tokio::test]
    async fn dependency_cycle_is_detected_with_members() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::with_dependencies(
                "a",
                "a",
                NodeSpec::default(),
                deps(&["b"]),
            ))
            .await
            .unwrap();
        engine
            .register(Node::with_dependencies(
                "b",
                "b",
                NodeSpec::default(),
                deps(&["a"]),
            ))
            .await
            .unwrap();

        match engine.check_cycles().await.unwrap_err() {
            GateError::DependencyCycle { mut members } => {
                members.sort();
                assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected DependencyCycle, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn acyclic_registry_passes_the_cycle_check() {
        let engine = GateEngine::new(KbStore::default());
        engine
            .register(Node::new("cart", "cart", NodeSpec::default()))
            .await
            .unwrap();
        engine
            .register(Node::with_dependencies(
                "checkout",
                "checkout",
                NodeSpec::default(),
                deps(&["cart", "missing-node"]),
            ))
            .await
            .unwrap();
        engine.check_cycles().await.unwrap();
    }

    #[tokio::test]
    async fn notifications_follow_the_flow() {
        let engine = GateEngine::new(KbStore::default());
        let mut rx = engine.notifications().subscribe();
        engine
            .register(Node::new("pages", "render a static page", signature_spec()))
            .await
            .unwrap();
        drive_to_implemented(&engine, "pages").await;

        let mut saw_candidate = false;
        let mut saw_implemented = false;
        while let Ok(notification) = rx.try_recv() {
            match notification {
                GateNotification::CandidateServed { node_id, .. } => {
                    assert_eq!(node_id, "pages");
                    saw_candidate = true;
                }
                GateNotification::NodeImplemented { node_id } => {
                    assert_eq!(node_id, "pages");
                    saw_implemented = true;
                }
                _ => {}
            }
        }
        assert!(saw_candidate);
        assert!(saw_implemented);
    }
}
