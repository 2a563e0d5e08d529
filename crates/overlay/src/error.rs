//! Error types for overlay drawing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DrawError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    /// The object list was replaced while a chunked draw was reading it.
    #[error("Concurrent modification: data generation {expected} changed to {found} mid-draw")]
    ConcurrentModification { expected: u64, found: u64 },

    #[error("Surface error: {0}")]
    Surface(String),
}

impl DrawError {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}
