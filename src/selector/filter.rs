//! Search filtering over fetched items

use std::collections::HashSet;

use super::item::SelectItem;

/// Case-insensitive substring match. An empty query matches everything.
pub fn matches(haystack: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&query.to_lowercase())
}

/// Items whose searchable text contains `query`, in their original order
pub fn filter_items<'a, T: SelectItem>(items: &'a [T], query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return items.iter().collect();
    }

    let query = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.searchable_text().to_lowercase().contains(&query))
        .collect()
}

/// Drop repeated identities, keeping the first occurrence
pub fn dedup_by_id<T: SelectItem>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id()))
        .collect()
}
