//! Gate notification system for observability.
//!
//! Emits [`GateNotification`]s via a [`tokio::sync::broadcast`] channel so
//! that external observers (loggers, dashboards, a CLI) can follow a node's
//! progress without coupling to the engine internals.

use serde::{Deserialize, Serialize};

use sentinel_types::{SourceTier, Verdict};

/// Notifications emitted while nodes move through the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GateNotification {
    NodeRegistered {
        node_id: String,
        status: String,
    },
    NodeUnlocked {
        node_id: String,
    },
    UnlockRefused {
        node_id: String,
        blocked_on: Vec<String>,
    },
    QuestionPosed {
        node_id: String,
        question_id: String,
    },
    AnswerRecorded {
        node_id: String,
        question_id: String,
    },
    InterviewCleared {
        node_id: String,
    },
    CandidateServed {
        node_id: String,
        tier: SourceTier,
        latency_ms: u64,
    },
    ValidationCompleted {
        node_id: String,
        verdict: Verdict,
        quality_score: u8,
    },
    NodeImplemented {
        node_id: String,
    },
    RevisionRequested {
        node_id: String,
    },
}

/// Notification bus wrapping a broadcast sender.
#[derive(Clone)]
pub struct NotificationBus {
    sender: tokio::sync::broadcast::Sender<GateNotification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit a notification to all current subscribers. With no active
    /// receivers the notification is silently dropped.
    pub fn emit(&self, notification: GateNotification) {
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<GateNotification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(256)
    }
}
