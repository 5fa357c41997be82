//! Editor configuration loaded from the environment.

use std::path::PathBuf;

use reelboard_generation::config::{CoordinatorConfig, ServiceConfig};
use reelboard_generation::error::ConfigError;

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub service: ServiceConfig,
    pub coordinator: CoordinatorConfig,
    /// One-shot hand-off payload to apply on startup (`REELBOARD_HANDOFF_FILE`).
    pub handoff_file: Option<PathBuf>,
}

impl EditorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service: ServiceConfig::from_env()?,
            coordinator: CoordinatorConfig::from_env()?,
            handoff_file: std::env::var_os("REELBOARD_HANDOFF_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Read and delete the hand-off file so the payload is applied at most once.
///
/// A missing file is not an error; the payload simply is not there.
pub async fn take_handoff_file(path: &std::path::Path) -> std::io::Result<Option<String>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Could not remove hand-off file");
    }
    Ok(Some(raw))
}
