//! Error types for image operations.

use sky_common::SkyError;
use thiserror::Error;

/// Errors that can occur while resampling or editing an image.
#[derive(Error, Debug)]
pub enum ImageOpsError {
    /// The output grid cannot be built; no partial image is produced.
    #[error("resampling failed: {message} (output {naxis1}x{naxis2})")]
    ResamplingDomain {
        message: String,
        naxis1: usize,
        naxis2: usize,
    },

    /// Header keywords are missing or inconsistent.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The operation only supports 2-D images.
    #[error("unsupported dimensions: {0}")]
    UnsupportedDimensions(String),

    /// The requested region does not intersect the image.
    #[error("requested region {requested} is outside image {image}")]
    OutOfBounds { requested: String, image: String },

    /// An argument is out of range.
    #[error("invalid value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// A sky position could not be converted.
    #[error("coordinate transform failed: {0}")]
    Transform(String),

    /// The header names a projection that is not implemented.
    #[error("unsupported projection: {0}")]
    UnsupportedProjection(String),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ImageOpsError {
    pub fn resampling(message: impl Into<String>, naxis1: usize, naxis2: usize) -> Self {
        Self::ResamplingDomain {
            message: message.into(),
            naxis1,
            naxis2,
        }
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

    pub fn out_of_bounds(requested: impl Into<String>, image: impl Into<String>) -> Self {
        Self::OutOfBounds {
            requested: requested.into(),
            image: image.into(),
        }
    }
}

impl From<SkyError> for ImageOpsError {
    fn from(err: SkyError) -> Self {
        match err {
            SkyError::TransformFailure(msg) => Self::Transform(msg),
            SkyError::InvalidHeader(msg) => Self::InvalidHeader(msg),
            SkyError::InvalidParameter { param, message } => Self::InvalidParameter { param, message },
            SkyError::UnsupportedProjection(msg) => Self::UnsupportedProjection(msg),
            SkyError::InvalidColor(msg) => Self::invalid_parameter("color", msg),
            SkyError::InvalidCoordSys(msg) => Self::invalid_parameter("csys", msg),
            SkyError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageOpsError>;
