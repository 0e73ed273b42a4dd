use common::entry::Entry;

use super::SortKey;

/// Sorts in place. The sort is stable, so ties keep catalog order.
pub fn sort_entries(entries: &mut [Entry], key: SortKey) {
    match key {
        SortKey::Name | SortKey::Popularity => {
            entries.sort_by_cached_key(|entry| entry.name.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_sort_ignores_case_and_keeps_ties_stable() {
        let mut entries = vec![
            Entry::new("beta").with_description("first"),
            Entry::new("Alpha"),
            Entry::new("BETA").with_description("second"),
            Entry::new("alpha2"),
        ];

        sort_entries(&mut entries, SortKey::Name);

        let order: Vec<_> = entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.description.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Alpha", ""),
                ("alpha2", ""),
                ("beta", "first"),
                ("BETA", "second"),
            ]
        );
    }
}
