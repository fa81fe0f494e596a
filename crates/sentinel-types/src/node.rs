//! Node — one unit of requested work — and its lifecycle state machine.
//!
//! The state machine is the gate's core guarantee: `status` is a private
//! field and [`Node::advance`] is the only way to move it. There is no
//! sequence of calls that reaches `Implemented` without a `ValidationPassed`
//! event backed by a passing report.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::report::ValidationReport;
use crate::{GateError, NodeStatus, Result};

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

/// One typed parameter in a node's spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: String,
}

/// The contract a candidate implementation must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub inputs: Vec<ParamSpec>,
    #[serde(default)]
    pub outputs: Vec<ParamSpec>,
    /// Named numeric limits, e.g. `max_complexity` or `max_loop_depth`.
    #[serde(default)]
    pub constraints: BTreeMap<String, i64>,
}

impl NodeSpec {
    /// Flattened text of the spec, used by risk triggers and keyword matching.
    pub fn as_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for p in self.inputs.iter().chain(self.outputs.iter()) {
            parts.push(format!("{}: {}", p.name, p.ty));
        }
        for (k, v) in &self.constraints {
            parts.push(format!("{k}={v}"));
        }
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// GateEvent — the inputs to the state machine
// ---------------------------------------------------------------------------

/// Events accepted by [`Node::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateEvent {
    DependenciesResolved,
    BeginPlanning,
    InterviewCleared,
    CandidateSubmitted,
    ValidationPassed,
    ValidationFailed,
}

// ---------------------------------------------------------------------------
// Answer — one recorded interview answer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub value: String,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One unit of requested work moving through the gate's lifecycle.
///
/// `status`, `answers`, and `validation_history` are mutated only through
/// [`advance`](Node::advance), [`insert_answer`](Node::insert_answer), and
/// [`push_report`](Node::push_report). Every mutation is all-or-nothing:
/// a rejected event leaves the node untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub description: String,
    pub spec: NodeSpec,
    pub upstream_dependencies: BTreeSet<String>,
    status: NodeStatus,
    answers: BTreeMap<String, Answer>,
    validation_history: Vec<ValidationReport>,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Node {
    /// Create a new node. Nodes with no upstream dependencies start `Idle`;
    /// nodes with dependencies start `Locked`.
    pub fn new(id: impl Into<String>, description: impl Into<String>, spec: NodeSpec) -> Self {
        Self::with_dependencies(id, description, spec, BTreeSet::new())
    }

    pub fn with_dependencies(
        id: impl Into<String>,
        description: impl Into<String>,
        spec: NodeSpec,
        upstream_dependencies: BTreeSet<String>,
    ) -> Self {
        let status = if upstream_dependencies.is_empty() {
            NodeStatus::Idle
        } else {
            NodeStatus::Locked
        };
        Self {
            id: id.into(),
            description: description.into(),
            spec,
            upstream_dependencies,
            status,
            answers: BTreeMap::new(),
            validation_history: Vec::new(),
            last_updated: chrono::Utc::now(),
        }
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn validation_history(&self) -> &[ValidationReport] {
        &self.validation_history
    }

    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.validation_history.last()
    }

    /// Description plus flattened spec, the text risk triggers and the
    /// knowledge base matcher run against.
    pub fn searchable_text(&self) -> String {
        let spec_text = self.spec.as_text();
        if spec_text.is_empty() {
            self.description.clone()
        } else {
            format!("{} {}", self.description, spec_text)
        }
    }

    /// Apply a lifecycle event. This is the single choke point through which
    /// a node may reach `Implemented`.
    ///
    /// `unmet_dependencies` is consulted only by `DependenciesResolved`: the
    /// ids of upstream nodes that are not yet `Implemented`, as observed by
    /// the caller. Any other event ignores it.
    ///
    /// Errors leave the node unchanged:
    /// - `DependencyUnmet` when unlocking with outstanding dependencies
    /// - `InvalidTransition` when the event is not legal from the current
    ///   state, including `ValidationPassed` without a passing report
    pub fn advance(&mut self, event: GateEvent, unmet_dependencies: &[String]) -> Result<NodeStatus> {
        let next = match (self.status, event) {
            (NodeStatus::Locked, GateEvent::DependenciesResolved) => {
                if !unmet_dependencies.is_empty() {
                    tracing::info!(
                        node = %self.id,
                        blocked_on = ?unmet_dependencies,
                        "Unlock refused: dependencies not met"
                    );
                    return Err(GateError::DependencyUnmet {
                        node_id: self.id.clone(),
                        blocked_on: unmet_dependencies.to_vec(),
                    });
                }
                NodeStatus::Idle
            }
            (NodeStatus::Idle, GateEvent::BeginPlanning) => NodeStatus::Planning,
            (NodeStatus::Planning, GateEvent::InterviewCleared) => NodeStatus::Coding,
            (NodeStatus::Coding, GateEvent::CandidateSubmitted) => NodeStatus::Validating,
            (NodeStatus::Validating, GateEvent::ValidationPassed) => {
                // Verify or die: the most recent report must be a pass.
                if !self.last_report().map(|r| r.passed()).unwrap_or(false) {
                    return Err(GateError::InvalidTransition {
                        from: self.status,
                        event,
                    });
                }
                NodeStatus::Implemented
            }
            (NodeStatus::Validating, GateEvent::ValidationFailed) => NodeStatus::Coding,
            (from, event) => {
                return Err(GateError::InvalidTransition { from, event });
            }
        };

        tracing::info!(node = %self.id, from = ?self.status, to = ?next, "Node transition");
        self.status = next;
        self.last_updated = chrono::Utc::now();
        Ok(next)
    }

    /// Record an interview answer. Overwrite-idempotent; membership in the
    /// question library is checked by the interview engine before this call.
    pub fn insert_answer(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.answers.insert(
            question_id.into(),
            Answer {
                value: value.into(),
                recorded_at: chrono::Utc::now(),
            },
        );
        self.last_updated = chrono::Utc::now();
    }

    /// Append a finalized validation report. Reports are immutable once
    /// appended; the history is append-only and survives abandonment.
    pub fn push_report(&mut self, report: ValidationReport) {
        self.validation_history.push(report);
        self.last_updated = chrono::Utc::now();
    }
}
