//! Error types shared across skyview crates.

use thiserror::Error;

/// Result type alias using SkyError.
pub type SkyResult<T> = Result<T, SkyError>;

/// Primary error type for coordinate and header handling.
#[derive(Debug, Error)]
pub enum SkyError {
    #[error("Coordinate transform failed: {0}")]
    TransformFailure(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid coordinate system: {0}")]
    InvalidCoordSys(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SkyError {
    pub fn transform_failure(msg: impl Into<String>) -> Self {
        Self::TransformFailure(msg.into())
    }

    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SkyError {
    fn from(err: serde_json::Error) -> Self {
        SkyError::Serialization(format!("JSON error: {}", err))
    }
}
