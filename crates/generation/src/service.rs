//! Seams between the coordinator and the remote generation services.
//!
//! The coordinator only talks to these traits, so tests can script the
//! service and the HTTP client in [`crate::api`] can be swapped for any
//! other backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Payload of a transition submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub start_image_ref: String,
    pub end_image_ref: String,
    pub prompt: String,
    pub duration_seconds: u32,
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub task_id: String,
    /// Vendor status string as reported at submission, if any.
    #[serde(default)]
    pub initial_status: Option<String>,
}

/// One status observation of a remote task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Raw vendor status; empty when the payload had none.
    #[serde(default)]
    pub raw_status: String,
    #[serde(default)]
    pub media_url: Option<String>,
}

impl StatusReport {
    pub fn new(raw_status: impl Into<String>) -> Self {
        Self {
            raw_status: raw_status.into(),
            media_url: None,
        }
    }

    pub fn with_media_url(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }
}

/// Remote video generation for transitions.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, ServiceError>;

    async fn status(&self, task_id: &str) -> Result<StatusReport, ServiceError>;
}

/// Remote still-image generation used to fill new frames.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Returns the generated image as a URL (usually a `data:` URL).
    async fn generate_image(
        &self,
        prompt: &str,
        reference_image: Option<&str>,
    ) -> Result<String, ServiceError>;
}
