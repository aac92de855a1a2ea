//! PokeAPI client implementation.
//!
//! `RecordSource` is the seam the fetcher talks to; `PokeApiClient` is the
//! HTTP implementation used outside of tests.

pub mod client;
pub mod types;

pub use client::{decode_record, PokeApiClient};
pub use types::*;

use crate::error::FetchError;
use async_trait::async_trait;
use shared::Record;

/// Something that can produce the record for a catalog id
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch and decode a single id
    async fn fetch(&self, id: u32) -> Result<Record, FetchError>;
}
