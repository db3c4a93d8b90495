//! Error types for the engine.
//!
//! Nothing the engine does while filtering a page is fatal; these errors only
//! surface at the edges (configuration parsing and cache persistence).

/// Error type for engine setup and cache persistence.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("cache entry '{key}' could not be encoded: {source}")]
    CacheEncode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache store rejected '{key}': {reason}")]
    CacheStore { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
