//! Result items and normalized query keys.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Namespace prefix for category sections stored alongside search queries.
pub const CATEGORY_NAMESPACE: &str = "home:";

/// A single search result.
///
/// Identity is the `id` alone: two items with the same id compare equal even
/// when their display fields differ.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
}

impl ResultItem {
    /// Create an item with only an id and title set.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self { id, title: title.into(), ..Default::default() }
    }

    /// Four-digit release year, if a release date is known.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|d| d.get(..4))
    }
}

impl PartialEq for ResultItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResultItem {}

impl std::hash::Hash for ResultItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Drop repeated ids, keeping the first occurrence and the original order.
pub fn dedup_by_id(items: impl IntoIterator<Item = ResultItem>) -> Vec<ResultItem> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id)).collect()
}

/// Normalized cache key for a query.
///
/// Search text is trimmed and lowercased, so `" Bat "`, `"bat"` and `"BAT"`
/// all map to the same key. Category sections live under `home:<category>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Key for a category section such as `now_playing` or `popular`.
    pub fn category(name: &str) -> Self {
        Self::new(&format!("{CATEGORY_NAMESPACE}{}", name.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_category(&self) -> bool {
        self.0.starts_with(CATEGORY_NAMESPACE)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_equivalence() {
        let keys = [QueryKey::new(" Bat "), QueryKey::new("bat"), QueryKey::new("BAT")];
        assert!(keys.iter().all(|k| k.as_str() == "bat"));
    }

    #[test]
    fn test_category_key() {
        let key = QueryKey::category("Popular");
        assert_eq!(key.as_str(), "home:popular");
        assert!(key.is_category());
        assert!(!QueryKey::new("popular").is_category());
    }

    #[test]
    fn test_category_key_is_stable_under_renormalization() {
        let key = QueryKey::category("now_playing");
        assert_eq!(QueryKey::new(key.as_str()), key);
    }

    #[test]
    fn test_item_equality_by_id() {
        let a = ResultItem::new(1, "Batman");
        let b = ResultItem { overview: Some("changed".into()), ..ResultItem::new(1, "Batman (1989)") };
        assert_eq!(a, b);
        assert_ne!(a, ResultItem::new(2, "Batman"));
    }

    #[test]
    fn test_dedup_by_id_keeps_first() {
        let items = vec![ResultItem::new(1, "first"), ResultItem::new(2, "b"), ResultItem::new(1, "second")];
        let deduped = dedup_by_id(items);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
    }

    #[test]
    fn test_release_year() {
        let item = ResultItem { release_date: Some("1989-06-23".into()), ..ResultItem::new(268, "Batman") };
        assert_eq!(item.release_year(), Some("1989"));
        assert_eq!(ResultItem::new(1, "x").release_year(), None);
    }
}
