//! Error types for the Sveriges Radio client

/// Result type alias for Sveriges Radio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the Sveriges Radio client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure, timeout or non-2xx status while fetching a page
    #[error("Request to {endpoint} failed: {source}")]
    FetchFailure {
        endpoint: String,
        #[source]
        source: ureq::Error,
    },

    /// The response body was not valid JSON
    #[error("Invalid JSON from {endpoint}: {source}")]
    InvalidJson {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded fine but the expected data key is missing
    #[error("Malformed response from {endpoint}: missing '{key}' array")]
    MalformedResponse { endpoint: String, key: String },

    /// A single record lacks a required field
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord { kind: &'static str, reason: String },

    /// Episode carries no playable audio URL (recoverable)
    #[error("No audio URL found for episode {episode_id}")]
    NoAudioUrlFound { episode_id: i64 },

    /// Episode refresh came back empty
    #[error("No episodes found for program {program_id}")]
    NoEpisodesFound { program_id: i64 },

    /// Caller passed arguments the API cannot honour
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error (program cache file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error outside of a page fetch (program cache file)
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl Error {
    /// Create a malformed record error
    pub fn malformed_record(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            kind,
            reason: reason.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// True for errors raised while fetching or decoding a page
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailure { .. } | Self::InvalidJson { .. })
    }

    /// True for data-quality gaps that callers may log and move past
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoAudioUrlFound { .. } | Self::NoEpisodesFound { .. }
        )
    }
}
