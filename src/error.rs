//! Error types for kirana-relay.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Chat transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to download media from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Failed to send message to {to}: {reason}")]
    SendFailed { to: String, reason: String },

    #[error("Message quota exhausted sending to {to}")]
    RateLimited { to: String },
}

impl TransportError {
    /// Whether this is the quota-exhaustion condition (not a hard failure).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Speech-to-text collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Transcription request failed: {0}")]
    RequestFailed(String),

    #[error("Transcription produced no text")]
    EmptyResult,
}

/// Text classification collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("Classification request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response from classifier: {0}")]
    InvalidResponse(String),

    #[error("Classifier returned no items")]
    NoItems,
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
