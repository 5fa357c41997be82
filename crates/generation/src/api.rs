//! REST client for the generation proxy.
//!
//! Wraps the proxy's transition and image endpoints using [`reqwest`].
//! Vendor payloads are passed through [`crate::status`] so callers only
//! ever see normalized receipts and reports.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::service::{GenerationService, ImageService, StatusReport, SubmitReceipt, SubmitRequest};
use crate::status::{extract_media_url, extract_raw_status, extract_task_id};

/// HTTP client for a single generation proxy.
#[derive(Debug, Clone)]
pub struct GenerationApi {
    client: reqwest::Client,
    api_url: String,
}

impl GenerationApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base URL, e.g. `http://localhost:3000/api/ai`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Build a client with the configured base URL and request timeout.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ServiceError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_response(response: reqwest::Response) -> Result<Value, ServiceError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl GenerationService for GenerationApi {
    /// `POST {base}/transition`.
    async fn submit(&self, request: &SubmitRequest) -> Result<SubmitReceipt, ServiceError> {
        let body = json!({
            "startImage": request.start_image_ref,
            "endImage": request.end_image_ref,
            "prompt": request.prompt,
            "duration": request.duration_seconds,
        });

        let response = self
            .client
            .post(self.endpoint("transition"))
            .json(&body)
            .send()
            .await?;
        let payload = Self::parse_response(response).await?;

        let task_id = extract_task_id(&payload)
            .ok_or_else(|| ServiceError::InvalidResponse("missing task id".to_string()))?;

        tracing::debug!(task_id = %task_id, "Transition task accepted");

        Ok(SubmitReceipt {
            task_id,
            initial_status: extract_raw_status(&payload),
        })
    }

    /// `GET {base}/transition/{taskId}`.
    async fn status(&self, task_id: &str) -> Result<StatusReport, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(&format!("transition/{task_id}")))
            .send()
            .await?;
        let payload = Self::parse_response(response).await?;

        Ok(StatusReport {
            raw_status: extract_raw_status(&payload).unwrap_or_default(),
            media_url: extract_media_url(&payload),
        })
    }
}

#[async_trait]
impl ImageService for GenerationApi {
    /// `POST {base}/image`.
    async fn generate_image(
        &self,
        prompt: &str,
        reference_image: Option<&str>,
    ) -> Result<String, ServiceError> {
        let body = json!({
            "prompt": prompt,
            "referenceImage": reference_image,
        });

        let response = self
            .client
            .post(self.endpoint("image"))
            .json(&body)
            .send()
            .await?;
        let payload = Self::parse_response(response).await?;

        ["image", "imageDataUrl"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::InvalidResponse("missing image".to_string()))
    }
}
