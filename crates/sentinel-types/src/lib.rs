//! Shared types, errors, and the node state machine for the Sentinel decision gate.
//!
//! This crate provides the foundational types used across all other Sentinel crates:
//! - `GateError` — unified error taxonomy
//! - `Node` / `NodeStatus` — one unit of requested work and its lifecycle state machine
//! - `ValidationReport` — aggregated outcome of one validation pipeline run
//! - `Candidate` — generated code plus its fallback provenance

use serde::{Deserialize, Serialize};

mod candidate;
mod node;
mod report;

pub use candidate::{Candidate, MissReason, SourceTier, TierMiss};
pub use node::{Answer, GateEvent, Node, NodeSpec, ParamSpec};
pub use report::{LayerResult, Severity, ValidationReport, Verdict};

/// Unified error type for all Sentinel subsystems.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    // === State machine errors ===
    #[error("Invalid transition: event {event:?} not applicable in state {from:?}")]
    InvalidTransition { from: NodeStatus, event: GateEvent },

    #[error("Node '{node_id}' cannot leave LOCKED: unmet dependencies {blocked_on:?}")]
    DependencyUnmet {
        node_id: String,
        blocked_on: Vec<String>,
    },

    #[error("Dependency cycle detected: {members:?}")]
    DependencyCycle { members: Vec<String> },

    // === Interview errors ===
    #[error("Unknown question id '{question_id}'")]
    UnknownQuestion { question_id: String },

    // === Registry errors ===
    #[error("Unknown node '{node_id}'")]
    UnknownNode { node_id: String },

    #[error("Node '{node_id}' is busy: another mutation is in progress")]
    NodeBusy { node_id: String },

    // === Validation errors ===
    #[error("Validation layer {layer_index} could not execute: {message}")]
    LayerError { layer_index: u8, message: String },

    // === Knowledge base errors ===
    #[error("Malformed knowledge base record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl GateError {
    /// Returns `true` if the error was caused by the caller and a corrected
    /// call may succeed. Every `GateError` is recoverable at the caller
    /// boundary; this distinguishes "fix your request" from "try again later".
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GateError::InvalidTransition { .. }
                | GateError::UnknownQuestion { .. }
                | GateError::UnknownNode { .. }
                | GateError::DependencyUnmet { .. }
        )
    }

    /// Returns `true` if the caller should back off and retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::NodeBusy { .. })
    }

    /// Maps the error to an HTTP status code for the transport layer.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GateError::InvalidTransition { .. } | GateError::DependencyUnmet { .. } => Some(409),
            GateError::UnknownQuestion { .. } => Some(400),
            GateError::UnknownNode { .. } => Some(404),
            GateError::NodeBusy { .. } => Some(429),
            GateError::DependencyCycle { .. } => Some(422),
            GateError::LayerError { .. } => Some(500),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, GateError>`.
pub type Result<T> = std::result::Result<T, GateError>;

// ---------------------------------------------------------------------------
// NodeStatus — fine-grained lifecycle state
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`Node`]. The six states are the source of truth;
/// callers outside the core only ever see the [`GateColor`] projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Locked,
    Idle,
    Planning,
    Coding,
    Validating,
    Implemented,
}

impl NodeStatus {
    /// Lossy traffic-light projection exposed at the caller boundary.
    /// Color is always derived here, never stored.
    pub fn color(&self) -> GateColor {
        match self {
            NodeStatus::Locked | NodeStatus::Idle | NodeStatus::Planning => GateColor::Red,
            NodeStatus::Coding | NodeStatus::Validating => GateColor::Orange,
            NodeStatus::Implemented => GateColor::Green,
        }
    }
}

/// Three-color status projection for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateColor {
    Red,
    Orange,
    Green,
}
