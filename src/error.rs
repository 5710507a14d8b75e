//! Error types for mail-insight.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Generative service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration file {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Generative text service errors.
///
/// Every variant is the fatal "unavailable" class: the service could not
/// produce an answer at all. Malformed *content* in an otherwise successful
/// response is not a `ServiceError` — stages recover from that locally by
/// falling back to deterministic logic.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Generative service unreachable: {reason}")]
    Unavailable { reason: String },

    #[error("Generative service request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Authentication failed for generative service")]
    AuthFailed,

    #[error("Generative service rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
}

/// Pipeline-level errors.
///
/// Only these cross the pipeline boundary. Fallback-tier degradation never
/// surfaces here — it is reported through per-stage provenance on the
/// completed record instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
