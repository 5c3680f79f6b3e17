use thiserror::Error;

/// Failures at the engine boundary.
///
/// Every variant has a neutral fallback inside the evaluation pipeline; only
/// the building blocks (extractor, resolver, ranker) surface them directly.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Address not found: '{address}'")]
    AddressNotFound { address: String },

    #[error("Data store unavailable while {operation}: {source}")]
    DataStoreUnavailable {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Geocoding service unavailable for '{address}': {reason}")]
    GeocoderUnavailable { address: String, reason: String },

    #[error("Malformed timestamp '{raw}'")]
    MalformedTimestamp { raw: String },

    #[error("Invalid route candidate: {0}")]
    InvalidCandidate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub fn store(operation: &'static str, source: rusqlite::Error) -> Self {
        EngineError::DataStoreUnavailable { operation, source }
    }

    /// True for failures a retry may clear (busy store, flaky network).
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::GeocoderUnavailable { .. } => true,
            EngineError::DataStoreUnavailable { source, .. } => matches!(
                source.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
