//! Emission error types.

/// Fatal errors of a generation run. Everything recoverable is reported as
/// a [`Diagnostic`](crate::diagnostics::Diagnostic) instead.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// A required global setting is absent or blank.
    #[error("missing required setting '{key}'")]
    MissingSetting { key: &'static str },

    /// A global setting cannot be used as a host identifier.
    #[error("invalid setting '{key}': {detail}")]
    InvalidSetting { key: &'static str, detail: String },

    /// Model or configuration error.
    #[error("model error: {0}")]
    Model(#[from] weft_model::ModelError),
}

/// Result type alias for emission operations.
pub type Result<T> = std::result::Result<T, EmitError>;
