use common::entry::Entry;
use serde::Deserialize;

/// Submitted add/edit payload, before it becomes an [`Entry`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub name: String,
    pub url: String,
    pub description: String,
    pub logo: String,
    /// Comma-separated tag list.
    pub tags: String,
    pub category: String,
    pub rating: Option<RatingInput>,
    pub featured: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Number(f64),
    Text(String),
}

impl RatingInput {
    fn value(&self) -> Option<f64> {
        let value = match self {
            RatingInput::Number(value) => *value,
            RatingInput::Text(raw) => raw.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl EntryForm {
    /// Builds the entry to store. Fields the form does not carry are taken
    /// from `previous`; an unparsable rating keeps the previous value (or 0).
    pub fn into_entry(self, previous: Option<&Entry>) -> Entry {
        let base = previous.cloned().unwrap_or_default();
        let rating = self
            .rating
            .as_ref()
            .and_then(RatingInput::value)
            .unwrap_or(base.rating);

        Entry {
            name: self.name.trim().to_owned(),
            url: self.url.trim().to_owned(),
            description: self.description,
            logo: self.logo.trim().to_owned(),
            tags: split_tags(&self.tags),
            category: self.category.trim().to_owned(),
            rating,
            featured: self.featured,
            ..base
        }
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
