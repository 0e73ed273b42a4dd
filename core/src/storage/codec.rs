//! JSON encoding of the backing file.
//!
//! The document is a top-level array of entries. The wrapper object
//! `{"sites": [...]}` is still accepted on read so older data files load.

use common::entry::Entry;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<Entry>),
    Wrapped { sites: Vec<Entry> },
}

pub fn decode(bytes: &[u8]) -> serde_json::Result<Vec<Entry>> {
    let document: Document = serde_json::from_slice(bytes)?;
    Ok(match document {
        Document::List(entries) => entries,
        Document::Wrapped { sites } => sites,
    })
}

pub fn encode(entries: &[Entry]) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(entries)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_top_level_array() {
        let raw = br#"[{"name":"Alpha","url":"https://alpha.example","tags":["ai"]}]"#;
        let entries = decode(raw).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Alpha");
        assert_eq!(entries[0].tags, vec!["ai".to_string()]);
    }

    #[test]
    fn decodes_wrapped_document() {
        let raw = br#"{"sites":[{"name":"Alpha"},{"name":"Beta"}]}"#;
        let names: Vec<_> = decode(raw).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn empty_array_is_an_empty_catalog() {
        assert!(decode(b"[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(decode(b"").is_err());
        assert!(decode(b"{\"name\":\"Alpha\"}").is_err());
        assert!(decode(b"[{\"name\": 42}]").is_err());
    }

    #[test]
    fn encoding_is_human_readable() {
        let entries = vec![Entry::new("Alpha").with_category("tools")];
        let text = String::from_utf8(encode(&entries).unwrap()).unwrap();

        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"category\": \"tools\""));
        assert!(text.ends_with("]\n"));
    }

    #[test]
    fn preserves_order_and_fields_through_encode() {
        let mut beta = Entry::new("Beta").with_tags(["search"]);
        beta.rating = 4.5;
        beta.visits = 12;
        beta.featured = true;
        beta.created_at = Some("2024-03-01".into());
        let entries = vec![Entry::new("Alpha"), beta];

        let decoded = decode(&encode(&entries).unwrap()).unwrap();
        assert_eq!(decoded, entries);
    }
}
