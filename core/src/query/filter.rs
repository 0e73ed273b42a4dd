use common::entry::Entry;

/// Case-insensitive substring match on name, description or any tag.
///
/// `needle` must already be lowercased; an empty needle matches everything.
pub fn matches_text(entry: &Entry, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    entry.name.to_lowercase().contains(needle)
        || entry.description.to_lowercase().contains(needle)
        || entry
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Exact, case-sensitive match against the category or any tag. An empty
/// filter is a no-op.
pub fn matches_category(entry: &Entry, category: &str) -> bool {
    category.is_empty()
        || entry.category == category
        || entry.tags.iter().any(|tag| tag == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_matches_name_description_and_tags() {
        let entry = Entry::new("Alpha Chat")
            .with_description("Conversational Assistant")
            .with_tags(["LLM"]);

        assert!(matches_text(&entry, "alpha"));
        assert!(matches_text(&entry, "assist"));
        assert!(matches_text(&entry, "llm"));
        assert!(!matches_text(&entry, "image"));
    }

    #[test]
    fn empty_text_matches_everything() {
        assert!(matches_text(&Entry::default(), ""));
    }

    #[test]
    fn category_is_case_sensitive_and_exact() {
        let entry = Entry::new("Alpha").with_category("tools");

        assert!(matches_category(&entry, "tools"));
        assert!(matches_category(&entry, ""));
        assert!(!matches_category(&entry, "Tools"));
        assert!(!matches_category(&entry, "tool"));
    }

    #[test]
    fn tag_membership_satisfies_a_category_filter() {
        let entry = Entry::new("Alpha").with_tags(["ai", "chat"]);

        assert!(matches_category(&entry, "ai"));
        assert!(matches_category(&entry, "chat"));
        assert!(!matches_category(&entry, "AI"));
        assert!(!matches_category(&entry, "cha"));
        assert!(!matches_category(&entry, "tools"));
    }
}
