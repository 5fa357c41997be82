//! Events emitted by the transition coordinator.
//!
//! These replace user-facing notifications: a front end subscribes and
//! renders them however it likes.

use chrono::{DateTime, Utc};
use reelboard_core::transition::TransitionStatus;
use reelboard_core::types::TransitionId;
use serde::Serialize;

/// A generation lifecycle change for one transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// The service accepted a job.
    Submitted {
        transition_id: TransitionId,
        task_id: String,
        /// Normalized status written after submission.
        status: TransitionStatus,
        at: DateTime<Utc>,
    },

    /// A poll moved the transition between `queued` and `running`.
    StatusChanged {
        transition_id: TransitionId,
        status: TransitionStatus,
        at: DateTime<Utc>,
    },

    /// The transition reached `ready`.
    Completed {
        transition_id: TransitionId,
        preview_url: Option<String>,
        at: DateTime<Utc>,
    },

    /// The transition reached `failed`.
    Failed {
        transition_id: TransitionId,
        /// Human-readable error description.
        reason: String,
        at: DateTime<Utc>,
    },

    /// Polling stopped before a terminal status was observed.
    Cancelled {
        transition_id: TransitionId,
        at: DateTime<Utc>,
    },
}

impl CoordinatorEvent {
    pub fn transition_id(&self) -> TransitionId {
        match self {
            Self::Submitted { transition_id, .. }
            | Self::StatusChanged { transition_id, .. }
            | Self::Completed { transition_id, .. }
            | Self::Failed { transition_id, .. }
            | Self::Cancelled { transition_id, .. } => *transition_id,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Submitted { at, .. }
            | Self::StatusChanged { at, .. }
            | Self::Completed { at, .. }
            | Self::Failed { at, .. }
            | Self::Cancelled { at, .. } => *at,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}
