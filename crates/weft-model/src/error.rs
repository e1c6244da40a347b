//! Model error types.

/// Errors that can occur while reading the foreign model or the override
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A raw type descriptor could not be parsed.
    #[error("invalid type descriptor '{descriptor}': {detail}")]
    InvalidType { descriptor: String, detail: String },

    /// The foreign model document is structurally invalid.
    #[error("invalid foreign model: {detail}")]
    InvalidModel { detail: String },

    /// An override entry could not be interpreted.
    #[error("invalid override: {detail}")]
    InvalidOverride { detail: String },

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
