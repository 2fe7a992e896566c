//! Telephone exchange call log and directory.
//!
//! [`graph::CallGraph`] records who called whom and ranks numbers by
//! popularity; [`phonebook::PhoneBookTrie`] answers prefix searches over
//! numbers and names; [`exchange::Exchange`] ties them together with the
//! blocklist and the contact directory.

pub mod config;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod ingest;
pub mod normalize;
pub mod persistence;
pub mod phonebook;
pub mod similarity;
pub mod trie;

pub use error::{ExchangeError, Result};
pub use exchange::{CallOutcome, Exchange, SharedExchange};
pub use graph::{Call, CallGraph, Node};
pub use phonebook::{Contact, PhoneBookTrie, SearchField};
pub use trie::Trie;
