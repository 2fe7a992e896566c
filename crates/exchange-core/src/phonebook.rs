//! Phone book search over three tries sharing the same contact records.

use crate::graph::CallGraph;
use crate::normalize::normalize_number;
use crate::trie::Trie;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Contact {
    /// "First Last", skipping missing parts.
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A search hit: the matched (normalized) key and the contact behind it.
pub type Hit = (String, Contact);

/// Which trie a query goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Phone,
    FirstName,
    LastName,
}

/// Results of querying all three tries at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchAll {
    pub phones: Vec<Hit>,
    pub first_names: Vec<Hit>,
    pub last_names: Vec<Hit>,
}

/// Tries keyed by phone number, first name and last name.
///
/// The three tries are only kept in step by [`PhoneBookTrie::add_contact`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneBookTrie {
    phones: Trie<Contact>,
    first_names: Trie<Contact>,
    last_names: Trie<Contact>,
}

impl Default for PhoneBookTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneBookTrie {
    pub fn new() -> Self {
        Self {
            phones: Trie::new("Phone Numbers"),
            first_names: Trie::new("First Names"),
            last_names: Trie::new("Last Names"),
        }
    }

    pub fn add_contact(&mut self, phone: &str, first_name: Option<&str>, last_name: Option<&str>) {
        let first_name = first_name.filter(|name| !name.is_empty());
        let last_name = last_name.filter(|name| !name.is_empty());

        let contact = Contact {
            phone: phone.to_string(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
        };

        if let Some(name) = first_name {
            self.first_names.insert(name, contact.clone());
        }
        if let Some(name) = last_name {
            self.last_names.insert(name, contact.clone());
        }
        self.phones.insert(phone, contact);
    }

    fn trie(&self, field: SearchField) -> &Trie<Contact> {
        match field {
            SearchField::Phone => &self.phones,
            SearchField::FirstName => &self.first_names,
            SearchField::LastName => &self.last_names,
        }
    }

    pub fn search(&self, field: SearchField, prefix: &str) -> Vec<Hit> {
        self.trie(field).prefix_query(prefix, None)
    }

    pub fn autocomplete(&self, field: SearchField, prefix: &str, max: usize) -> Vec<Hit> {
        self.trie(field).autocomplete(prefix, max)
    }

    pub fn search_by_phone(&self, prefix: &str) -> Vec<Hit> {
        self.search(SearchField::Phone, prefix)
    }

    pub fn search_by_first_name(&self, prefix: &str) -> Vec<Hit> {
        self.search(SearchField::FirstName, prefix)
    }

    pub fn search_by_last_name(&self, prefix: &str) -> Vec<Hit> {
        self.search(SearchField::LastName, prefix)
    }

    pub fn autocomplete_phone(&self, prefix: &str, max: usize) -> Vec<Hit> {
        self.autocomplete(SearchField::Phone, prefix, max)
    }

    pub fn autocomplete_first_name(&self, prefix: &str, max: usize) -> Vec<Hit> {
        self.autocomplete(SearchField::FirstName, prefix, max)
    }

    pub fn autocomplete_last_name(&self, prefix: &str, max: usize) -> Vec<Hit> {
        self.autocomplete(SearchField::LastName, prefix, max)
    }

    pub fn search_all(&self, query: &str) -> SearchAll {
        SearchAll {
            phones: self.search_by_phone(query),
            first_names: self.search_by_first_name(query),
            last_names: self.search_by_last_name(query),
        }
    }

    /// Entry counts of the phone, first name and last name tries.
    pub fn sizes(&self) -> (usize, usize, usize) {
        (
            self.phones.size(),
            self.first_names.size(),
            self.last_names.size(),
        )
    }
}

/// Orders search hits by the popularity of each contact's number, most
/// popular first. Hits with equal scores keep their trie order.
pub fn rank_by_popularity(hits: Vec<Hit>, graph: &CallGraph) -> Vec<(Hit, f64)> {
    let mut ranked: Vec<(Hit, f64)> = hits
        .into_iter()
        .map(|hit| {
            let score = graph.popularity(&normalize_number(&hit.1.phone));
            (hit, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
