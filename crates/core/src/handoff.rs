//! One-shot session hand-off into the editor.
//!
//! Another screen (prompt-to-image, for instance) can leave a payload
//! `{ image, prompt, source, referenceImage? }` for the editor. The
//! editor applies it to the first frame exactly once: the slot is emptied
//! the moment it is read, whether or not the payload turns out to be valid,
//! so re-entering the editor never replays it.

use serde::Deserialize;

use crate::error::CoreError;
use crate::frame::{FrameAsset, FrameUpdate};
use crate::timeline::TimelineEngine;
use crate::types::{FrameId, Metadata};

/// Payload produced by an external generation step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameHandoff {
    pub image: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub reference_image: Option<String>,
}

impl FrameHandoff {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let handoff: Self =
            serde_json::from_str(raw).map_err(|e| CoreError::Hydration(e.to_string()))?;
        if handoff.image.trim().is_empty() {
            return Err(CoreError::Hydration("image must not be empty".to_string()));
        }
        Ok(handoff)
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        if !self.prompt.is_empty() {
            metadata.insert("prompt".into(), self.prompt.clone().into());
        }
        if !self.source.is_empty() {
            metadata.insert("source".into(), self.source.clone().into());
        }
        if let Some(reference) = &self.reference_image {
            metadata.insert("referenceImage".into(), reference.clone().into());
        }
        metadata
    }
}

/// Holds at most one raw hand-off payload until the editor consumes it.
#[derive(Debug, Clone, Default)]
pub struct HandoffSlot {
    pending: Option<String>,
}

impl HandoffSlot {
    pub fn new(raw: Option<String>) -> Self {
        Self { pending: raw }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply the pending payload to the first concrete frame.
    ///
    /// Returns `Ok(None)` when nothing was pending. The slot is cleared
    /// before parsing; a malformed payload leaves the timeline untouched.
    /// With no concrete frame yet, one is appended for the payload.
    pub fn consume(&mut self, engine: &mut TimelineEngine) -> Result<Option<FrameId>, CoreError> {
        let Some(raw) = self.pending.take() else {
            return Ok(None);
        };
        let handoff = FrameHandoff::parse(&raw)?;

        let frame_id = match engine.frame_at(0) {
            Some(frame) => frame.id,
            None => engine.add_frame(&handoff.image, None),
        };

        let changes = FrameUpdate::default()
            .asset(FrameAsset::image(handoff.image.clone(), None))
            .metadata(handoff.metadata());
        engine.update_frame(frame_id, changes);

        Ok(Some(frame_id))
    }
}
