//! The whole in-memory state of the exchange: call graph, phone book,
//! blocklist and contact directory.

use crate::graph::{Call, CallGraph};
use crate::normalize::{is_valid_number, normalize_number};
use crate::phonebook::{rank_by_popularity, Hit, PhoneBookTrie, SearchField};
use crate::similarity::{did_you_mean, Suggestion};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Directory record for one number, as imported from the contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// Number exactly as written in the source file.
    pub original_number: String,
}

/// Result of offering a call to the exchange on the live path.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Recorded(Call),
    /// One of the parties is on the blocklist.
    Blocked(String),
    /// Empty or non-numeric number, or a call to oneself.
    Invalid,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Exchange {
    pub graph: CallGraph,
    pub phonebook: PhoneBookTrie,
    pub blocklist: BTreeSet<String>,
    pub directory: BTreeMap<String, DirectoryEntry>,
}

/// Exchange shared between threads: one writer or many readers, so a call is
/// never observed half-applied.
pub type SharedExchange = Arc<RwLock<Exchange>>;

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedExchange {
        Arc::new(RwLock::new(self))
    }

    /// Registers a contact under its normalized number. Returns false, and
    /// registers nothing, when the number normalizes to nothing.
    ///
    /// The first word of `full_name` is the first name and the remaining
    /// words the last name.
    pub fn add_contact(&mut self, full_name: &str, number: &str) -> bool {
        let normalized = normalize_number(number);
        if normalized.is_empty() {
            debug!(name = full_name, "contact without a number ignored");
            return false;
        }

        let full_name = full_name.trim();
        let mut words = full_name.split_whitespace();
        let first_name = words.next().unwrap_or_default().to_string();
        let last_name = words.collect::<Vec<_>>().join(" ");

        self.phonebook
            .add_contact(&normalized, Some(&first_name), Some(&last_name));
        self.graph.add_phone(&normalized);
        self.directory.insert(
            normalized,
            DirectoryEntry {
                first_name,
                last_name,
                full_name: full_name.to_string(),
                original_number: number.trim().to_string(),
            },
        );
        true
    }

    /// Adds `number` to the blocklist. Returns false if it was already there
    /// or normalizes to nothing.
    pub fn block(&mut self, number: &str) -> bool {
        let normalized = normalize_number(number);
        !normalized.is_empty() && self.blocklist.insert(normalized)
    }

    pub fn is_blocked(&self, number: &str) -> bool {
        self.blocklist.contains(&normalize_number(number))
    }

    /// Admits a new call unless a party is blocked or a number is invalid.
    pub fn record_call(
        &mut self,
        caller: &str,
        callee: &str,
        duration: u64,
        timestamp: Option<NaiveDateTime>,
    ) -> CallOutcome {
        if !is_valid_number(caller) || !is_valid_number(callee) {
            return CallOutcome::Invalid;
        }
        if let Some(blocked) = [caller, callee].into_iter().find(|n| self.is_blocked(n)) {
            debug!(number = %blocked, "call refused, number is blocked");
            return CallOutcome::Blocked(normalize_number(blocked));
        }

        match self.graph.add_call(caller, callee, duration, timestamp) {
            Some(call) => CallOutcome::Recorded(call.clone()),
            None => CallOutcome::Invalid,
        }
    }

    /// True if the number is in the directory or has a graph node.
    pub fn knows(&self, number: &str) -> bool {
        let normalized = normalize_number(number);
        self.directory.contains_key(&normalized) || self.graph.lookup(&normalized).is_some()
    }

    /// "Full Name (original number)" for directory entries, else the number.
    pub fn display_name(&self, number: &str) -> String {
        let normalized = normalize_number(number);
        match self.directory.get(&normalized) {
            Some(entry) => format!("{} ({})", entry.full_name, entry.original_number),
            None => normalized,
        }
    }

    /// Known numbers similar to `query`. Searches the directory, or the call
    /// graph when no contacts were imported.
    pub fn suggest(&self, query: &str) -> Vec<Suggestion> {
        let query = normalize_number(query);
        if self.directory.is_empty() {
            did_you_mean(&query, self.graph.numbers())
        } else {
            did_you_mean(&query, self.directory.keys().map(String::as_str))
        }
    }

    /// Phone book search ranked by popularity.
    pub fn search(&self, field: SearchField, query: &str) -> Vec<(Hit, f64)> {
        rank_by_popularity(self.phonebook.search(field, query), &self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> Exchange {
        let mut exchange = Exchange::new();
        exchange.add_contact("Ana Petrović", "064 111-1111");
        exchange.add_contact("Ana Jovanović", "0642222222");
        exchange.add_contact("Jovan Van Der Berg", "0653333333");
        exchange.add_contact("Cher", "0664444444");
        exchange
    }

    #[test]
    fn test_add_contact_populates_every_index() {
        let exchange = exchange();
        assert_eq!(exchange.graph.size(), 4);
        assert!(exchange.graph.contains("0641111111"));

        let entry = &exchange.directory["0641111111"];
        assert_eq!(entry.first_name, "Ana");
        assert_eq!(entry.last_name, "Petrović");
        assert_eq!(entry.original_number, "064 111-1111");

        assert_eq!(exchange.directory["0653333333"].last_name, "Van Der Berg");
        assert_eq!(exchange.directory["0664444444"].last_name, "");

        let hits = exchange.phonebook.search_by_phone("0641");
        assert_eq!(hits[0].1.phone, "0641111111");
        assert!(exchange.phonebook.search_by_last_name("").iter().all(|(_, c)| c.phone != "0664444444"));
    }

    #[test]
    fn test_display_name() {
        let exchange = exchange();
        assert_eq!(
            exchange.display_name("0641111111"),
            "Ana Petrović (064 111-1111)"
        );
        assert_eq!(exchange.display_name("011 555"), "011555");
    }

    #[test]
    fn test_blocked_calls_are_refused() {
        let mut exchange = exchange();
        assert!(exchange.block("064-222 2222"));
        assert!(!exchange.block("0642222222"));

        let outcome = exchange.record_call("0641111111", "0642222222", 60, None);
        assert_eq!(outcome, CallOutcome::Blocked("0642222222".to_string()));
        assert_eq!(exchange.graph.call_count(), 0);
    }

    #[test]
    fn test_invalid_calls_are_refused() {
        let mut exchange = exchange();
        assert_eq!(exchange.record_call("06x", "0642222222", 60, None), CallOutcome::Invalid);
        assert_eq!(exchange.record_call("0641111111", "064 111 1111", 60, None), CallOutcome::Invalid);
        assert_eq!(exchange.graph.call_count(), 0);

        match exchange.record_call("0641111111", "0642222222", 60, None) {
            CallOutcome::Recorded(call) => assert_eq!(call.duration, 60),
            other => panic!("expected a recorded call, got {other:?}"),
        }
    }

    #[test]
    fn test_search_is_ranked_by_popularity() {
        let mut exchange = exchange();
        exchange.record_call("0653333333", "0642222222", 120, None);

        let ranked = exchange.search(SearchField::FirstName, "ana");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0 .1.phone, "0642222222");
    }

    #[test]
    fn test_suggest_prefers_directory() {
        let exchange = exchange();
        let suggestions = exchange.suggest("064111111");
        assert_eq!(suggestions[0].number, "0641111111");
        assert!(exchange.knows("0641111111"));
        assert!(!exchange.knows("064111111"));
    }

    #[test]
    fn test_suggest_falls_back_to_graph() {
        let mut exchange = Exchange::new();
        exchange.graph.add_call("0641111111", "0642222222", 10, None);
        let numbers: Vec<String> = exchange
            .suggest("0641111112")
            .into_iter()
            .map(|s| s.number)
            .collect();
        // "0642222222" only shares "064" and one digit
        assert_eq!(numbers, ["0641111111"]);
    }

    #[test]
    fn test_shared_exchange_readers_see_whole_calls() {
        let shared = exchange().into_shared();
        let writer = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let mut exchange = shared.write().unwrap();
                    exchange.record_call("0641111111", "0642222222", 60, None);
                }
            })
        };

        for _ in 0..100 {
            let exchange = shared.read().unwrap();
            let node = exchange.graph.lookup("0642222222").unwrap();
            assert_eq!(node.incoming_duration(), node.incoming_count() as u64 * 60);
            let expected = if node.incoming_count() == 0 {
                0.0
            } else {
                node.incoming_count() as f64 * 10.0 + node.incoming_count() as f64 * 0.5
            };
            assert!((exchange.graph.popularity("0642222222") - expected).abs() < 1e-9);
        }

        writer.join().unwrap();
        assert_eq!(shared.read().unwrap().graph.call_count(), 100);
    }

    #[test]
    fn test_contact_without_number_is_ignored() {
        let mut exchange = Exchange::new();
        assert!(!exchange.add_contact("Ana Petrović", ""));
        assert!(!exchange.add_contact("Marko Marković", " - "));
        assert!(exchange.add_contact("Ana Petrović", "0641111111"));

        assert_eq!(exchange.graph.size(), 1);
        assert_eq!(exchange.directory.len(), 1);
        assert!(!exchange.directory.contains_key(""));
        assert_eq!(exchange.phonebook.search_by_first_name("ana").len(), 1);
    }
}
