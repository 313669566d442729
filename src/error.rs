//! Error types for Focus Flux

use thiserror::Error;

/// Errors that can occur at the edges of the classification pipeline.
///
/// The classification stages themselves never fail; these variants cover
/// parsing, validation, configuration and encoding.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse sample payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid timezone offset: {0}")]
    InvalidTimezone(String),

    #[error("Invalid focus profile: {0}")]
    InvalidProfile(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
