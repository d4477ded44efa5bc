/// Error types shared across the soil-info crates.
///
/// These errors represent failures of the two upstream government services
/// (address lookup and soil examination). Application-specific errors are
/// defined in the service crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Business-level error reported by an upstream service. The message is
    /// the service's own text, passed through unmodified.
    #[error("{0}")]
    Upstream(String),
}
