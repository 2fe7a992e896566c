//! Prefix tree over normalized string keys, with one or more records per key.

use crate::normalize::normalize_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrieNode<T> {
    children: BTreeMap<char, TrieNode<T>>,
    is_key: bool,
    records: Vec<T>,
}

impl<T> TrieNode<T> {
    fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            is_key: false,
            records: Vec::new(),
        }
    }
}

/// Ordered prefix tree. Keys are normalized with [`normalize_key`] on every
/// insert and lookup; nodes are never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trie<T> {
    name: String,
    root: TrieNode<T>,
}

impl<T> Trie<T>
where
    T: Clone + PartialEq,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: TrieNode::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches `record` to `key`. Empty keys are ignored, and a record equal
    /// to one already stored under the key is not added twice.
    pub fn insert(&mut self, key: &str, record: T) {
        let key = normalize_key(key);
        if key.is_empty() {
            return;
        }

        let node = key.chars().fold(&mut self.root, |node, c| {
            node.children.entry(c).or_insert_with(TrieNode::new)
        });
        node.is_key = true;

        if !node.records.contains(&record) {
            node.records.push(record);
        }
    }

    fn find(&self, normalized: &str) -> Option<&TrieNode<T>> {
        normalized
            .chars()
            .try_fold(&self.root, |node, c| node.children.get(&c))
    }

    /// Records stored under exactly `key`, or `None` if `key` was never inserted.
    pub fn search(&self, key: &str) -> Option<&[T]> {
        self.find(&normalize_key(key))
            .filter(|node| node.is_key)
            .map(|node| node.records.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_some()
    }

    /// Every `(key, record)` pair whose key starts with `prefix`, depth first
    /// in character order, truncated to `limit` entries. A limit of 0 is no limit.
    pub fn prefix_query(&self, prefix: &str, limit: Option<usize>) -> Vec<(String, T)> {
        let prefix = normalize_key(prefix);
        let limit = limit.filter(|&max| max > 0);
        let mut results = Vec::new();

        if let Some(node) = self.find(&prefix) {
            let mut key = prefix;
            Self::collect(node, &mut key, limit, &mut results);
        }
        results
    }

    /// Returns true once `limit` is reached.
    fn collect(
        node: &TrieNode<T>,
        key: &mut String,
        limit: Option<usize>,
        results: &mut Vec<(String, T)>,
    ) -> bool {
        let full = |results: &Vec<(String, T)>| limit.is_some_and(|max| results.len() >= max);

        if node.is_key {
            for record in &node.records {
                results.push((key.clone(), record.clone()));
                if full(results) {
                    return true;
                }
            }
        }

        for (&c, child) in &node.children {
            key.push(c);
            let done = Self::collect(child, key, limit, results);
            key.pop();
            if done {
                return true;
            }
        }
        false
    }

    /// Bounded prefix query used for suggestions.
    pub fn autocomplete(&self, prefix: &str, max: usize) -> Vec<(String, T)> {
        self.prefix_query(prefix, Some(max))
    }

    /// All entries in the trie.
    pub fn entries(&self) -> Vec<(String, T)> {
        self.prefix_query("", None)
    }

    /// Number of `(key, record)` entries.
    pub fn size(&self) -> usize {
        fn count<T>(node: &TrieNode<T>) -> usize {
            let own = if node.is_key { node.records.len() } else { 0 };
            own + node.children.values().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

impl<T> fmt::Display for Trie<T>
where
    T: Clone + PartialEq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trie(name='{}', size={})", self.name, self.size())
    }
}

/// Default number of suggestions returned by autocomplete.
pub const DEFAULT_SUGGESTIONS: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_prefix_query() {
        let mut trie = Trie::new("numbers");
        trie.insert("0641234567", "P");

        let hits = trie.prefix_query("064", None);
        assert!(hits.contains(&("0641234567".to_string(), "P")));
        assert_eq!(trie.search("0641234567"), Some(&["P"][..]));
    }

    #[test]
    fn test_duplicate_records_are_suppressed() {
        let mut trie = Trie::new("numbers");
        trie.insert("0641234567", "P".to_string());
        trie.insert("064-123 4567", "P".to_string());
        trie.insert("0641234567", "Q".to_string());

        assert_eq!(
            trie.search("0641234567").unwrap(),
            ["P".to_string(), "Q".to_string()]
        );
        assert_eq!(trie.size(), 2);
    }

    #[test]
    fn test_search_is_exact() {
        let mut trie = Trie::new("names");
        trie.insert("Marko", 1);

        assert_eq!(trie.search("marko"), Some(&[1][..]));
        assert_eq!(trie.search("MARKO"), Some(&[1][..]));
        assert_eq!(trie.search("mar"), None);
        assert_eq!(trie.search("markovic"), None);
        assert!(trie.contains_key("mar ko"));
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let mut trie = Trie::new("names");
        trie.insert("", 1);
        trie.insert(" - ", 2);
        assert!(trie.is_empty());
        assert_eq!(trie.size(), 0);
    }

    #[test]
    fn test_prefix_query_order_and_limit() {
        let mut trie = Trie::new("names");
        for (name, id) in [("Milan", 1), ("Marko", 2), ("Mara", 3), ("Ana", 4), ("Marko", 5)] {
            trie.insert(name, id);
        }

        let hits = trie.prefix_query("m", None);
        assert_eq!(
            hits,
            vec![
                ("mara".to_string(), 3),
                ("marko".to_string(), 2),
                ("marko".to_string(), 5),
                ("milan".to_string(), 1),
            ]
        );

        let limited = trie.prefix_query("M", Some(2));
        assert_eq!(limited, hits[..2]);
        assert!(trie.prefix_query("z", None).is_empty());
        assert_eq!(trie.prefix_query("m", Some(0)), hits);
        assert_eq!(trie.autocomplete("m", 0).len(), 4);
    }

    #[test]
    fn test_key_that_is_prefix_of_another() {
        let mut trie = Trie::new("numbers");
        trie.insert("064", 'a');
        trie.insert("0641", 'b');

        let hits = trie.autocomplete("064", DEFAULT_SUGGESTIONS);
        assert_eq!(hits, vec![("064".to_string(), 'a'), ("0641".to_string(), 'b')]);
        assert_eq!(trie.entries().len(), 2);
    }

    #[test]
    fn test_display() {
        let mut trie = Trie::new("First Names");
        trie.insert("Ana", 1);
        assert_eq!(trie.to_string(), "Trie(name='First Names', size=1)");
    }
}
