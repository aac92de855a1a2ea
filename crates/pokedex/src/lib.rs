//! Pokédex catalog library.
//!
//! Fetches the first-generation Pokémon from PokeAPI into an in-memory
//! catalog, tracks which ones the user has captured, and derives per-type
//! counts for the full catalog and the captured subset.

pub mod api;
pub mod catalog;
pub mod error;
pub mod fetcher;
pub mod stats;

pub use api::{PokeApiClient, RecordSource};
pub use catalog::CatalogStore;
pub use error::{CatalogError, FetchError};
pub use fetcher::{FetchFailure, FetchReport, RecordFetcher};
pub use stats::{aggregate, panel, selected, CaptureProgress, CategoryCounts, PanelRow, TranslationTable};
