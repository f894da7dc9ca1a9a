//! Crate-wide error type.
//!
//! Variants carry pre-rendered strings so the type stays `Clone` — errors
//! ride inside broadcast events alongside successful results.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Caller referenced a command absent from the manifest. Rejected before
    /// any network activity.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Network failure or non-2xx response from the API.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response body was not a JSON object carrying a `result` field.
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),

    /// Cache store became unusable (lock poisoned by a panicking thread).
    #[error("cache error: {0}")]
    Cache(String),

    /// Poll registry became unusable.
    #[error("poll error: {0}")]
    Poll(String),

    /// `start_poll` was given a zero interval.
    #[error("poll interval must be greater than zero")]
    InvalidInterval,

    /// Aircraft identifier not present in the reference table.
    #[error("unknown aircraft id: {0}")]
    UnknownAircraft(String),

    /// Livery identifier not present in the reference table.
    #[error("unknown livery id: {0}")]
    UnknownLivery(String),
}
