use thiserror::Error;

use crate::metadata::Nft;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Transport failures and transient statuses are worth another attempt.
    /// Client errors and undecodable bodies will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            FetchError::Decode { .. } | FetchError::Other(_) => false,
        }
    }
}

/// A page failed mid-way through a project's collection.
#[derive(Error, Debug)]
#[error("project {project_id}: page {page} failed after {} records: {source}", .fetched.len())]
pub struct PaginationError {
    pub project_id: u64,
    pub page: u32,
    /// Records from the pages that succeeded, in page order.
    pub fetched: Vec<Nft>,
    #[source]
    pub source: FetchError,
}
