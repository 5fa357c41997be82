//! Frame value types.
//!
//! A frame is one still image (or video) occupying one position in the
//! timeline. The trailing "add next frame here" slot is a frame too, but
//! it is tagged [`FrameKind::Placeholder`] instead of relying on an id
//! convention.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{FrameId, Metadata};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default display duration of a frame in milliseconds.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 5000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Distinguishes real content frames from the trailing placeholder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameKind {
    Concrete,
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Image,
    Video,
}

/// Media backing a frame. Empty URLs are only valid on the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAsset {
    pub kind: AssetKind,
    pub url: String,
    pub thumbnail_url: String,
}

impl FrameAsset {
    /// Image asset; the thumbnail falls back to the full-size URL.
    pub fn image(url: impl Into<String>, thumbnail_url: Option<&str>) -> Self {
        let url = url.into();
        let thumbnail_url = thumbnail_url.map(str::to_string).unwrap_or_else(|| url.clone());
        Self {
            kind: AssetKind::Image,
            url,
            thumbnail_url,
        }
    }

    fn empty() -> Self {
        Self {
            kind: AssetKind::Image,
            url: String::new(),
            thumbnail_url: String::new(),
        }
    }
}

/// Engine-owned processing state of a frame. Never derived automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameStatus {
    Ready,
    Processing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    pub kind: FrameKind,
    /// Zero-based position. Concrete frames occupy `0..N`, the placeholder sits at `N`.
    pub order: usize,
    pub asset: FrameAsset,
    pub duration_ms: u32,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub status: FrameStatus,
}

impl Frame {
    pub(crate) fn concrete(order: usize, asset: FrameAsset) -> Self {
        Self {
            id: FrameId::new(),
            kind: FrameKind::Concrete,
            order,
            asset,
            duration_ms: DEFAULT_FRAME_DURATION_MS,
            metadata: Metadata::new(),
            status: FrameStatus::Ready,
        }
    }

    pub(crate) fn placeholder(order: usize) -> Self {
        Self {
            id: FrameId::new(),
            kind: FrameKind::Placeholder,
            order,
            asset: FrameAsset::empty(),
            duration_ms: DEFAULT_FRAME_DURATION_MS,
            metadata: Metadata::new(),
            status: FrameStatus::Ready,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == FrameKind::Placeholder
    }

    /// Merge the set fields of `changes` into this frame. Id and order are untouched.
    pub(crate) fn apply(&mut self, changes: FrameUpdate) {
        if let Some(asset) = changes.asset {
            self.asset = asset;
        }
        if let Some(duration) = changes.duration_ms {
            self.duration_ms = duration.get();
        }
        if let Some(metadata) = changes.metadata {
            self.metadata = metadata;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
    }
}

/// Partial changes for [`TimelineEngine::update_frame`](crate::timeline::TimelineEngine::update_frame).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUpdate {
    pub asset: Option<FrameAsset>,
    pub duration_ms: Option<NonZeroU32>,
    pub metadata: Option<Metadata>,
    pub status: Option<FrameStatus>,
}

impl FrameUpdate {
    pub fn asset(mut self, asset: FrameAsset) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn duration_ms(mut self, duration: NonZeroU32) -> Self {
        self.duration_ms = Some(duration);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn status(mut self, status: FrameStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.asset.is_none()
            && self.duration_ms.is_none()
            && self.metadata.is_none()
            && self.status.is_none()
    }
}
