//! PokeAPI HTTP client.

use super::types::PokemonResponse;
use super::RecordSource;
use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use shared::{ApiConfig, Record};
use tracing::debug;

/// PokeAPI `/pokemon` client
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    /// HTTP client (shares its connection pool across clones)
    client: Client,
    /// Endpoint ids are appended to
    base_url: String,
    /// Reject payloads without a front sprite
    require_thumbnail: bool,
}

impl PokeApiClient {
    /// Create a new client from the API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            require_thumbnail: config.require_thumbnail,
        })
    }

    /// Build `{base_url}/{id}`
    pub fn endpoint(&self, id: u32) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, id);
        Url::parse(&raw).map_err(|e| FetchError::UrlConstruction {
            id,
            reason: format!("{}: {}", raw, e),
        })
    }
}

#[async_trait]
impl RecordSource for PokeApiClient {
    async fn fetch(&self, id: u32) -> Result<Record, FetchError> {
        let url = self.endpoint(id)?;
        debug!(id = id, url = %url, "Making API request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport { id, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { id, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { id, source })?;

        decode_record(id, &body, self.require_thumbnail)
    }
}

/// Decode a `/pokemon/{id}` body into a record for the requested id.
///
/// Fails when the body does not match the expected shape, when it lists no
/// types, when it describes a different id, or (with `require_thumbnail`)
/// when `sprites.front_default` is missing or null.
pub fn decode_record(id: u32, body: &[u8], require_thumbnail: bool) -> Result<Record, FetchError> {
    let payload: PokemonResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::decode(id, e.to_string()))?;

    if payload.id != id {
        return Err(FetchError::decode(
            id,
            format!("payload describes id {}", payload.id),
        ));
    }

    if payload.types.is_empty() {
        return Err(FetchError::decode(id, "payload lists no types"));
    }

    if require_thumbnail && payload.sprites.front_default.is_none() {
        return Err(FetchError::decode(id, "missing sprites.front_default"));
    }

    let mut record = payload.into_record();
    if record.thumbnail_url.as_deref() == Some("") {
        record.thumbnail_url = None;
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::fetcher::RecordFetcher;
    use std::sync::Arc;

    const BULBASAUR: &str = r#"{
        "id": 1,
        "name": "bulbasaur",
        "height": 7,
        "sprites": {
            "front_default": "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/1.png",
            "back_default": null
        },
        "types": [
            { "slot": 1, "type": { "name": "grass", "url": "https://pokeapi.co/api/v2/type/12/" } },
            { "slot": 2, "type": { "name": "poison", "url": "https://pokeapi.co/api/v2/type/4/" } }
        ]
    }"#;

    #[test]
    fn test_client_creation() {
        let client = PokeApiClient::new(&ApiConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint() {
        let mut config = ApiConfig::default();
        config.base_url = "https://pokeapi.co/api/v2/pokemon/".to_string();
        let client = PokeApiClient::new(&config).unwrap();

        let url = client.endpoint(25).unwrap();
        assert_eq!(url.as_str(), "https://pokeapi.co/api/v2/pokemon/25");
    }

    #[test]
    fn test_endpoint_rejects_malformed_base() {
        let mut config = ApiConfig::default();
        config.base_url = "not a url".to_string();
        let client = PokeApiClient::new(&config).unwrap();

        let err = client.endpoint(3).unwrap_err();
        assert!(matches!(err, FetchError::UrlConstruction { id: 3, .. }));
    }

    #[test]
    fn test_decode_record() {
        let record = decode_record(1, BULBASAUR.as_bytes(), true).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "bulbasaur");
        assert_eq!(record.categories, vec!["grass", "poison"]);
        assert!(record.thumbnail_url.unwrap().ends_with("/1.png"));
        assert!(!record.selected);
    }

    #[test]
    fn test_decode_missing_thumbnail_strict() {
        let body = r#"{"id": 7, "name": "squirtle", "sprites": {}, "types": [{"type": {"name": "water"}}]}"#;
        let err = decode_record(7, body.as_bytes(), true).unwrap_err();
        assert!(matches!(err, FetchError::Decode { id: 7, .. }));
    }

    #[test]
    fn test_decode_null_thumbnail_lenient() {
        let body = r#"{"id": 7, "name": "squirtle", "sprites": {"front_default": null}, "types": [{"type": {"name": "water"}}]}"#;
        let record = decode_record(7, body.as_bytes(), false).unwrap();
        assert_eq!(record.thumbnail_url, None);
        assert_eq!(record.categories, vec!["water"]);
    }

    #[test]
    fn test_decode_rejects_empty_types() {
        let body = r#"{"id": 4, "name": "charmander", "sprites": {"front_default": "x"}, "types": []}"#;
        let err = decode_record(4, body.as_bytes(), true).unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_decode_rejects_id_mismatch() {
        let err = decode_record(2, BULBASAUR.as_bytes(), true).unwrap_err();
        assert_eq!(err.id(), 2);
        assert!(err.to_string().contains("payload describes id 1"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_record(9, b"<html>rate limited</html>", true).unwrap_err();
        assert!(matches!(err, FetchError::Decode { id: 9, .. }));
    }

    fn client_for(base_url: &str) -> Arc<PokeApiClient> {
        let mut config = ApiConfig::default();
        config.base_url = base_url.to_string();
        config.timeout_seconds = Some(5);
        Arc::new(PokeApiClient::new(&config).unwrap())
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_transport_failures() {
        let store = CatalogStore::new();
        let fetcher = RecordFetcher::new(client_for("http://127.0.0.1:1/pokemon"), store.clone());

        let report = fetcher.fetch_all(1..=3).await;

        assert!(store.is_empty());
        assert_eq!(report.requested, 3);
        assert_eq!(report.failed_ids(), vec![1, 2, 3]);
        assert!(report.failures.iter().all(|f| f.kind == "transport"));
    }

    #[tokio::test]
    async fn test_malformed_base_skips_every_id() {
        let store = CatalogStore::new();
        let fetcher = RecordFetcher::new(client_for("not a url"), store.clone());

        let report = fetcher.fetch_all(1..=3).await;

        assert!(store.is_empty());
        assert_eq!(report.requested, 3);
        assert_eq!(report.fetched, 0);
        assert_eq!(report.failed_ids(), vec![1, 2, 3]);
        assert!(report.failures.iter().all(|f| f.kind == "url"));
    }
}
