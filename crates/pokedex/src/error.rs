//! Error types for fetching and catalog mutation.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single catalog id could not be turned into a record.
///
/// None of these are fatal to a batch; the id is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request URL for id {id}: {reason}")]
    UrlConstruction { id: u32, reason: String },

    #[error("request for id {id} failed: {source}")]
    Transport {
        id: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for id {id} returned status {status}")]
    Status { id: u32, status: StatusCode },

    #[error("could not decode id {id}: {reason}")]
    Decode { id: u32, reason: String },
}

impl FetchError {
    /// Catalog id the failure belongs to
    pub fn id(&self) -> u32 {
        match self {
            FetchError::UrlConstruction { id, .. }
            | FetchError::Transport { id, .. }
            | FetchError::Status { id, .. }
            | FetchError::Decode { id, .. } => *id,
        }
    }

    /// Short label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::UrlConstruction { .. } => "url",
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode { .. } => "decode",
        }
    }

    pub(crate) fn decode(id: u32, reason: impl Into<String>) -> Self {
        FetchError::Decode {
            id,
            reason: reason.into(),
        }
    }
}

/// Errors from mutating the catalog store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no record with id {0} in the catalog")]
    NotFound(u32),
}
