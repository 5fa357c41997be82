//! Transition records and their generation status machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{FrameId, TransitionId};

/// Fixed length of every generated transition clip in milliseconds.
pub const TRANSITION_DURATION_MS: u32 = 5000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Generation status of a transition.
///
/// `idle -> queued -> running -> {ready | failed}`, plus `needs-regenerate`
/// reachable from `ready`. `needs-regenerate` accepts a fresh submission
/// like `idle` but keeps the previous preview until it is overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionStatus {
    Idle,
    Queued,
    Running,
    Ready,
    Failed,
    NeedsRegenerate,
}

impl TransitionStatus {
    /// `ready` and `failed` receive no further automatic changes.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Statuses for which a remote task is still outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Statuses from which a new generation may be submitted.
    pub fn accepts_submission(self) -> bool {
        matches!(self, Self::Idle | Self::Failed | Self::NeedsRegenerate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::NeedsRegenerate => "needs-regenerate",
        }
    }
}

impl fmt::Display for TransitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// A generated video bridging two adjacent concrete frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: TransitionId,
    pub from_frame_id: FrameId,
    pub to_frame_id: FrameId,
    pub prompt: String,
    pub duration_ms: u32,
    pub status: TransitionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl Transition {
    pub(crate) fn between(from: FrameId, to: FrameId) -> Self {
        Self {
            id: TransitionId::new(),
            from_frame_id: from,
            to_frame_id: to,
            prompt: String::new(),
            duration_ms: TRANSITION_DURATION_MS,
            status: TransitionStatus::Idle,
            preview_url: None,
            task_id: None,
        }
    }

    pub fn connects(&self, from: FrameId, to: FrameId) -> bool {
        self.from_frame_id == from && self.to_frame_id == to
    }

    /// Generation duration in whole seconds, as the service expects it.
    pub fn duration_secs(&self) -> u32 {
        (self.duration_ms + 500) / 1000
    }

    pub(crate) fn apply(&mut self, changes: TransitionUpdate) {
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(prompt) = changes.prompt {
            self.prompt = prompt;
        }
        if let Some(preview_url) = changes.preview_url {
            self.preview_url = preview_url;
        }
        if let Some(task_id) = changes.task_id {
            self.task_id = task_id;
        }
    }
}

/// Partial changes for a transition.
///
/// `preview_url` and `task_id` are doubly optional: the outer `None` leaves
/// the field alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionUpdate {
    pub status: Option<TransitionStatus>,
    pub prompt: Option<String>,
    pub preview_url: Option<Option<String>>,
    pub task_id: Option<Option<String>>,
}

impl TransitionUpdate {
    pub fn status(status: TransitionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(Some(url.into()));
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(Some(task_id.into()));
        self
    }

    pub fn clear_task_id(mut self) -> Self {
        self.task_id = Some(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(TransitionStatus::Ready.is_terminal());
        assert!(TransitionStatus::Failed.is_terminal());
        assert!(!TransitionStatus::Running.is_terminal());
        assert!(!TransitionStatus::NeedsRegenerate.is_terminal());
    }

    #[test]
    fn submission_allowed_only_from_resting_statuses() {
        let allowed: Vec<_> = [
            TransitionStatus::Idle,
            TransitionStatus::Queued,
            TransitionStatus::Running,
            TransitionStatus::Ready,
            TransitionStatus::Failed,
            TransitionStatus::NeedsRegenerate,
        ]
        .into_iter()
        .filter(|s| s.accepts_submission())
        .collect();

        assert_eq!(
            allowed,
            vec![
                TransitionStatus::Idle,
                TransitionStatus::Failed,
                TransitionStatus::NeedsRegenerate
            ]
        );
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TransitionStatus::NeedsRegenerate).unwrap();
        assert_eq!(json, "\"needs-regenerate\"");
        assert_eq!(TransitionStatus::NeedsRegenerate.to_string(), "needs-regenerate");
    }

    #[test]
    fn duration_secs_rounds() {
        let t = Transition::between(FrameId::new(), FrameId::new());
        assert_eq!(t.duration_secs(), 5);
    }

    #[test]
    fn update_can_clear_task_id() {
        let mut t = Transition::between(FrameId::new(), FrameId::new());
        t.apply(TransitionUpdate::status(TransitionStatus::Running).with_task_id("task-1"));
        assert_eq!(t.task_id.as_deref(), Some("task-1"));

        t.apply(TransitionUpdate::default().clear_task_id());
        assert_eq!(t.task_id, None);
        assert_eq!(t.status, TransitionStatus::Running);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut t = Transition::between(FrameId::new(), FrameId::new());
        let before = t.clone();
        t.apply(TransitionUpdate::default());
        assert_eq!(t, before);
    }
}
