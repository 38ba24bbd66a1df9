// src/core/errors.rs - Core error types for the routine synthesis system

use thiserror::Error;

/// Core system errors, one variant per §7 error kind plus the ambient
/// kinds needed by configuration loading and the HTTP adapter.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("chat completion service unavailable: {0}")]
    ChatUnavailable(String),

    #[error("LLM response could not be parsed or repaired: {0}")]
    ResponseMalformed(String),

    #[error("catalog index and metadata are inconsistent: {reason}")]
    CatalogInconsistent { reason: String },

    #[error("request canceled or deadline exceeded: {0}")]
    Deadline(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn input_invalid(msg: impl Into<String>) -> Self {
        Self::InputInvalid(msg.into())
    }

    pub fn embedding_unavailable(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    pub fn chat_unavailable(msg: impl Into<String>) -> Self {
        Self::ChatUnavailable(msg.into())
    }

    pub fn response_malformed(msg: impl Into<String>) -> Self {
        Self::ResponseMalformed(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable kind string surfaced in the error envelope (§7).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputInvalid(_) => "InputInvalid",
            Self::EmbeddingUnavailable(_) => "EmbeddingUnavailable",
            Self::ChatUnavailable(_) => "ChatUnavailable",
            Self::ResponseMalformed(_) => "ResponseMalformed",
            Self::CatalogInconsistent { .. } => "CatalogInconsistent",
            Self::Deadline(_) => "Deadline",
            Self::Config(_) => "ConfigError",
            Self::Serialization(_) => "ResponseMalformed",
            Self::Http(_) => "ChatUnavailable",
            Self::Internal(_) => "Internal",
        }
    }

    /// Whether this error kind permits a `fallback_recommendations` field
    /// on the emitted envelope, per §7.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            Self::ChatUnavailable(_) | Self::ResponseMalformed(_) | Self::Http(_)
        )
    }
}
