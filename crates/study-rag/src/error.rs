//! Error types for the study assistant

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for study-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a (user, subject) index cannot serve queries yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Nothing was ever uploaded for the pair
    Missing,
    /// The index row exists but its collection holds no vectors
    Empty,
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexState::Missing => {
                f.write_str("No vector index for this subject. Upload materials first.")
            }
            IndexState::Empty => f.write_str("Vector index is empty."),
        }
    }
}

/// Study assistant errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upload produced no usable text
    #[error("No text extracted.")]
    NoTextExtracted,

    /// Entity not found or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vector index missing or empty at query time
    #[error("{0}")]
    IndexNotReady(IndexState),

    /// Retrieval returned zero candidates
    #[error("No relevant material found for: {0}")]
    NoRelevantMaterial(String),

    /// External call exceeded its deadline
    #[error("{provider} timed out during {operation}")]
    ProviderTimeout { provider: String, operation: String },

    /// External service could not be reached
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorDb(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Model output did not match the expected structure
    #[error("Could not parse model output: {0}")]
    GenerationParse(String),

    /// Relational store error
    #[error("Database error: {0}")]
    Database(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a generation parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::GenerationParse(message.into())
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a timeout error
    pub fn timeout(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for failures of an external AI or storage service
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::ProviderTimeout { .. }
                | Error::ProviderUnavailable { .. }
                | Error::Embedding(_)
                | Error::VectorDb(_)
                | Error::Llm(_)
                | Error::GenerationParse(_)
                | Error::Http(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            Error::NoTextExtracted => (StatusCode::BAD_REQUEST, "no_text"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::IndexNotReady(IndexState::Missing) => (StatusCode::NOT_FOUND, "index_not_ready"),
            Error::IndexNotReady(IndexState::Empty) => (StatusCode::CONFLICT, "index_not_ready"),
            Error::NoRelevantMaterial(_) => (StatusCode::CONFLICT, "no_relevant_material"),
            Error::ProviderTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "provider_timeout"),
            Error::ProviderUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable")
            }
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
            Error::GenerationParse(_) => (StatusCode::BAD_GATEWAY, "generation_parse_error"),
            Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
