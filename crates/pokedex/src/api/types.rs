//! PokeAPI response types.
//!
//! Only the fields the catalog consumes are modelled; serde ignores the rest
//! of the (very large) `/pokemon/{id}` payload.

use serde::Deserialize;
use shared::Record;

/// `/pokemon/{id}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonResponse {
    pub id: u32,
    pub name: String,
    pub sprites: Sprites,
    pub types: Vec<TypeSlot>,
}

/// Sprite URLs
#[derive(Debug, Clone, Deserialize)]
pub struct Sprites {
    /// Null for entries without artwork; may also be absent entirely
    #[serde(default)]
    pub front_default: Option<String>,
}

/// One entry of the `types` array
#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub type_ref: NamedResource,
}

/// `{ "name": ..., "url": ... }` reference used throughout PokeAPI
#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

impl PokemonResponse {
    /// Category keys in payload order
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.type_ref.name.clone()).collect()
    }

    /// Convert into an unselected catalog record
    pub fn into_record(self) -> Record {
        let categories = self.type_names();
        Record::new(self.id, self.name, self.sprites.front_default, categories)
    }
}
