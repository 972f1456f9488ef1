use thiserror::Error;

/// Failures surfaced by the remote fact and translation adapters.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("invalid provider url: {0}")]
    InvalidUrl(String),
    #[error("network request failed: {0}")]
    Network(String),
    #[error("failed to decode provider response: {0}")]
    Decoding(String),
    #[error("unknown category: {0}")]
    CategoryNotFound(String),
}
