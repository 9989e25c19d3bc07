/// Convenience result type used across the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level error taxonomy used by compositor, encoder and scheduler APIs.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Invalid user-provided parameters or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failures while producing pixels for a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Failures reported by the encoder sink or while publishing its artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Missing or unreadable process-wide resources (overlay assets).
    #[error("resource error: {0}")]
    Resource(String),

    /// Work abandoned because its cancellation token fired.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Build a [`PipelineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PipelineError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PipelineError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PipelineError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`PipelineError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Return `true` for [`PipelineError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
