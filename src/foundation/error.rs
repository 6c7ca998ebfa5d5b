/// Convenience result type used across the viewer.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Top-level error taxonomy used by viewer APIs.
///
/// Per-tile and per-image failures are contained by the engine (recorded on the tile or the
/// registry slot). Only `Validation` errors from constructors indicate integration bugs.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// Invalid construction arguments or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed image manifest or descriptor.
    #[error("format error: {0}")]
    Format(String),

    /// Tile fetch or decode failure.
    #[error("load error: {0}")]
    Load(String),

    /// Tile fetch exceeded the loader timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewerError {
    /// Build a [`ViewerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ViewerError::Format`] value.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Build a [`ViewerError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`ViewerError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build a [`ViewerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
