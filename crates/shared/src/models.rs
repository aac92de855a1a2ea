//! Data models for the project.
//!
//! This module defines the catalog entry shared between the fetcher, the
//! catalog store and the statistics code.

use serde::{Deserialize, Serialize};

/// One catalog entry (a Pokémon) as kept in memory for the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// PokeAPI id, unique within the catalog
    pub id: u32,
    /// Raw remote name (lowercase, e.g. "bulbasaur")
    pub name: String,
    /// Front sprite URL, `None` when the remote has no image
    pub thumbnail_url: Option<String>,
    /// Category (type) keys in remote order, never empty
    pub categories: Vec<String>,
    /// Captured flag, owned by the user and never sent by the remote
    #[serde(default)]
    pub selected: bool,
}

impl Record {
    /// Create an unselected record
    pub fn new(
        id: u32,
        name: impl Into<String>,
        thumbnail_url: Option<String>,
        categories: Vec<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            thumbnail_url,
            categories,
            selected: false,
        }
    }

    /// Name as shown on the grid buttons: every run of letters and digits
    /// starts uppercase and continues lowercase (`mr-mime` -> `Mr-Mime`)
    pub fn display_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut word_start = true;
        for c in self.name.chars() {
            if c.is_alphanumeric() {
                if word_start {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                word_start = false;
            } else {
                out.push(c);
                word_start = true;
            }
        }
        out
    }

    /// Flip the captured flag and return the new value
    pub fn toggle(&mut self) -> bool {
        self.selected = !self.selected;
        self.selected
    }
}
