//! Error types for the interview engine.

use uuid::Uuid;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
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

/// Text-generation oracle errors.
///
/// Any failure to obtain a usable reply is `Unavailable` from the session's
/// point of view: the inbound turn counts as not yet applied and may be
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Invalid oracle response: {reason}")]
    InvalidResponse { reason: String },
}

/// Interview session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Interview session {0} not found")]
    NotFound(Uuid),

    #[error("Interview session {0} is closed")]
    Closed(Uuid),

    #[error("Interview session {0} is already complete")]
    Completed(Uuid),

    #[error("Vacancy {0} has no interview stages enabled")]
    NoEnabledStages(Uuid),

    #[error("Descriptor lookup failed: {0}")]
    Descriptor(#[from] DatabaseError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),
}
