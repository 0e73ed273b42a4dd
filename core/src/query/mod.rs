//! Pure query functions over a catalog snapshot.
//!
//! Nothing here takes a lock; callers hand in an already-captured slice.

use std::collections::BTreeSet;
use std::fmt;

use common::entry::Entry;

pub mod filter;
pub mod sort;

pub use filter::{matches_category, matches_text};
pub use sort::sort_entries;

/// Ordering requested by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    /// No popularity signal is tracked yet; orders like `Name`.
    Popularity,
}

impl SortKey {
    /// Parses a request parameter. Unknown or empty keys mean "catalog order".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Some(SortKey::Name),
            "popularity" => Some(SortKey::Popularity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search, category and sort parameters of one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub text: String,
    pub category: String,
    pub sort: Option<SortKey>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(text: &str, category: &str, sort: &str) -> Self {
        Self {
            text: text.to_owned(),
            category: category.to_owned(),
            sort: SortKey::parse(sort),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    /// Runs the query against a snapshot and returns the selected entries.
    pub fn run(&self, entries: &[Entry]) -> Vec<Entry> {
        let needle = self.text.to_lowercase();
        let mut selected: Vec<Entry> = entries
            .iter()
            .filter(|entry| matches_category(entry, &self.category))
            .filter(|entry| matches_text(entry, &needle))
            .cloned()
            .collect();

        if let Some(key) = self.sort {
            sort_entries(&mut selected, key);
        }
        selected
    }
}

/// Distinct non-empty values a category filter can select: explicit
/// categories plus every tag.
pub fn unique_categories(entries: &[Entry]) -> BTreeSet<String> {
    let mut values: BTreeSet<String> = entries
        .iter()
        .filter(|entry| entry.is_categorized())
        .map(|entry| entry.category.clone())
        .collect();
    values.extend(unique_tags(entries));
    values
}

/// Distinct non-empty tags present in the snapshot.
pub fn unique_tags(entries: &[Entry]) -> BTreeSet<String> {
    entries
        .iter()
        .flat_map(|entry| entry.tags.iter())
        .filter(|tag| !tag.is_empty())
        .cloned()
        .collect()
}
