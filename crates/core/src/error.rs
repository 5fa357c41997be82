#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Hand-off payload rejected: {0}")]
    Hydration(String),

    #[error("Timeline invariant violated: {0}")]
    Invariant(String),
}
