use std::num::ParseIntError;
use thiserror::Error;

/// Failures returned by a [`BeaconClient`](crate::BeaconClient).
#[derive(Debug, Error)]
pub enum BeaconError {
    /// The node implementation has no equivalent for this query.
    #[error("not implemented by this beacon node")]
    NotImplemented,

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status code.
    #[error("request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body did not have the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A numeric field arrived as a string that is not an integer.
    #[error("invalid {field} {value:?}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl BeaconError {
    /// True for the capability marker, as opposed to an actual failure.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, BeaconError::NotImplemented)
    }
}
