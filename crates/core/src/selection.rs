use serde::{Deserialize, Serialize};

use crate::types::{FrameId, TransitionId};

/// What the user currently has selected. At most one item at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "kebab-case")]
pub enum Selection {
    #[default]
    None,
    Frame(FrameId),
    Transition(TransitionId),
}

impl Selection {
    pub fn frame_id(&self) -> Option<FrameId> {
        match self {
            Self::Frame(id) => Some(*id),
            _ => None,
        }
    }

    pub fn transition_id(&self) -> Option<TransitionId> {
        match self {
            Self::Transition(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
