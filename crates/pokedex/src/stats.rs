//! Category statistics over the catalog.
//!
//! Counts are recomputed on demand from a snapshot: callers pull
//! `aggregate(&store.all(), ..)` after each mutation they care about.

use once_cell::sync::Lazy;
use serde::Serialize;
use shared::Record;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Translated category name -> number of occurrences
pub type CategoryCounts = BTreeMap<String, usize>;

/// Pokémon type keys and their Portuguese display names
const POKEMON_TYPES: [(&str, &str); 18] = [
    ("normal", "Normal"),
    ("fire", "Fogo"),
    ("water", "Água"),
    ("grass", "Planta"),
    ("electric", "Elétrico"),
    ("ice", "Gelo"),
    ("fighting", "Lutador"),
    ("poison", "Venenoso"),
    ("ground", "Terrestre"),
    ("flying", "Voador"),
    ("psychic", "Psíquico"),
    ("bug", "Inseto"),
    ("rock", "Pedra"),
    ("ghost", "Fantasma"),
    ("dragon", "Dragão"),
    ("dark", "Noturno"),
    ("steel", "Aço"),
    ("fairy", "Fada"),
];

static POKEMON_TYPE_TABLE: Lazy<TranslationTable> =
    Lazy::new(|| TranslationTable::from_pairs(POKEMON_TYPES));

/// Read-only mapping from category key to display name
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    names: HashMap<String, String>,
}

impl TranslationTable {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            names: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The built-in table for the 18 Pokémon types
    pub fn pokemon_types() -> &'static TranslationTable {
        &POKEMON_TYPE_TABLE
    }

    /// Display name for `key`, or `key` itself when it is not in the table
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.names.get(key).map(String::as_str).unwrap_or(key)
    }

    /// All display names, sorted
    pub fn display_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.values().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Count translated categories over `records`.
///
/// A record with two categories bumps two counters. Input order never
/// affects the result and an empty input yields an empty map.
pub fn aggregate<'a, I>(records: I, table: &TranslationTable) -> CategoryCounts
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = CategoryCounts::new();
    for record in records {
        for key in &record.categories {
            *counts.entry(table.translate(key).to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Records currently marked as captured, in their original relative order
pub fn selected(records: &[Record]) -> Vec<Record> {
    records.iter().filter(|r| r.selected).cloned().collect()
}

/// One line of a statistics panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRow {
    pub name: String,
    pub count: usize,
}

/// Panel rows: every display name in `table` sorted, zero-filled, followed by
/// any untranslated keys that showed up in `counts`.
pub fn panel(counts: &CategoryCounts, table: &TranslationTable) -> Vec<PanelRow> {
    let known = table.display_names();

    let mut rows: Vec<PanelRow> = known
        .iter()
        .map(|name| PanelRow {
            name: name.to_string(),
            count: counts.get(*name).copied().unwrap_or(0),
        })
        .collect();

    // BTreeMap iteration is already sorted
    rows.extend(
        counts
            .iter()
            .filter(|(name, _)| !known.contains(&name.as_str()))
            .map(|(name, count)| PanelRow {
                name: name.clone(),
                count: *count,
            }),
    );

    rows
}

/// "captured / catalog size" header of the statistics screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureProgress {
    pub captured: usize,
    pub total: usize,
}

impl CaptureProgress {
    pub fn new(records: &[Record], total: usize) -> Self {
        Self {
            captured: records.iter().filter(|r| r.selected).count(),
            total,
        }
    }
}

impl fmt::Display for CaptureProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.captured, self.total)
    }
}
