//! Call graph: phone numbers as nodes, individual calls as edges.
//!
//! Calls are stored once in an append-only arena and referenced from both
//! endpoints by [`CallId`], so a call is shared by the caller's outgoing list
//! and the callee's incoming list without being copied.

use crate::normalize::normalize_number;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Score per incoming call.
const CALL_WEIGHT: f64 = 10.0;
/// Score per minute of incoming call time.
const MINUTE_WEIGHT: f64 = 0.5;
/// Weight of the callers' own average incoming volume.
const CALLER_WEIGHT: f64 = 2.0;

/// Source of default timestamps for calls recorded without one.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Index of a call in the graph's call arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(u32);

impl CallId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One call between two numbers. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub source: String,
    pub destination: String,
    /// Seconds
    pub duration: u64,
    pub timestamp: NaiveDateTime,
}

impl Call {
    /// True when the call connects `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.destination == b) || (self.source == b && self.destination == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
    All,
}

/// Aggregate call record of a single phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    number: String,
    incoming: Vec<CallId>,
    outgoing: Vec<CallId>,
    incoming_duration: u64,
    outgoing_duration: u64,
}

impl Node {
    fn new(number: String) -> Self {
        Self {
            number,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            incoming_duration: 0,
            outgoing_duration: 0,
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn incoming(&self) -> &[CallId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[CallId] {
        &self.outgoing
    }

    pub fn incoming_count(&self) -> usize {
        self.incoming.len()
    }

    pub fn outgoing_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn total_count(&self) -> usize {
        self.incoming_count() + self.outgoing_count()
    }

    /// Total incoming call time in seconds.
    pub fn incoming_duration(&self) -> u64 {
        self.incoming_duration
    }

    /// Total outgoing call time in seconds.
    pub fn outgoing_duration(&self) -> u64 {
        self.outgoing_duration
    }

    /// Mean call length in seconds, 0 when there are no calls in `direction`.
    pub fn average_duration(&self, direction: Direction) -> f64 {
        let (count, duration) = match direction {
            Direction::Incoming => (self.incoming_count(), self.incoming_duration),
            Direction::Outgoing => (self.outgoing_count(), self.outgoing_duration),
            Direction::All => (
                self.total_count(),
                self.incoming_duration.saturating_add(self.outgoing_duration),
            ),
        };
        if count == 0 {
            0.0
        } else {
            duration as f64 / count as f64
        }
    }
}

/// Directed multigraph of calls with a memoized popularity score per number.
///
/// The popularity cache is cleared as a whole on every new call: a node's
/// score depends on the incoming volume of its callers, so any edge anywhere
/// can change it.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    calls: Vec<Call>,
    #[serde(skip)]
    popularity_cache: Mutex<HashMap<String, f64>>,
    #[serde(skip, default = "default_clock")]
    clock: Clock,
}

fn default_clock() -> Clock {
    local_now
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CallGraph {
    pub fn new() -> Self {
        Self::with_clock(local_now)
    }

    /// Graph whose calls without a timestamp are stamped by `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            calls: Vec::new(),
            popularity_cache: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Snapshots do not carry the clock; a loaded graph stamps with local time
    /// until one is set again.
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Returns the node for `number`, creating an empty one if needed.
    pub fn add_phone(&mut self, number: &str) -> &Node {
        let idx = self.ensure_node(normalize_number(number));
        &self.nodes[idx]
    }

    fn ensure_node(&mut self, number: String) -> usize {
        if let Some(&idx) = self.index.get(&number) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(number.clone(), idx);
        self.nodes.push(Node::new(number));
        idx
    }

    /// Records a call from `caller` to `callee`.
    ///
    /// Returns `None` without recording anything when either number is empty
    /// after normalization or when both are the same number.
    pub fn add_call(
        &mut self,
        caller: &str,
        callee: &str,
        duration: u64,
        timestamp: Option<NaiveDateTime>,
    ) -> Option<&Call> {
        let caller = normalize_number(caller);
        let callee = normalize_number(callee);

        if caller.is_empty() || callee.is_empty() || caller == callee {
            debug!(%caller, %callee, "rejected call");
            return None;
        }

        let timestamp = timestamp.unwrap_or_else(self.clock);
        let caller_idx = self.ensure_node(caller.clone());
        let callee_idx = self.ensure_node(callee.clone());

        let id = CallId(self.calls.len() as u32);
        self.calls.push(Call {
            source: caller,
            destination: callee,
            duration,
            timestamp,
        });

        let caller_node = &mut self.nodes[caller_idx];
        caller_node.outgoing.push(id);
        caller_node.outgoing_duration = caller_node.outgoing_duration.saturating_add(duration);

        let callee_node = &mut self.nodes[callee_idx];
        callee_node.incoming.push(id);
        callee_node.incoming_duration = callee_node.incoming_duration.saturating_add(duration);

        self.cache_mut().clear();

        self.calls.last()
    }

    fn cache_mut(&mut self) -> &mut HashMap<String, f64> {
        self.popularity_cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, f64>> {
        self.popularity_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lookup(&self, number: &str) -> Option<&Node> {
        self.node(&normalize_number(number))
    }

    fn node(&self, normalized: &str) -> Option<&Node> {
        self.index.get(normalized).map(|&idx| &self.nodes[idx])
    }

    pub fn contains(&self, number: &str) -> bool {
        self.lookup(number).is_some()
    }

    pub fn call(&self, id: CallId) -> Option<&Call> {
        self.calls.get(id.index())
    }

    /// Resolves a node's call list to the calls themselves.
    pub fn calls_of<'a>(&'a self, ids: &'a [CallId]) -> impl Iterator<Item = &'a Call> + 'a {
        ids.iter().filter_map(move |&id| self.call(id))
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Known numbers in insertion order.
    pub fn numbers(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(Node::number)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// Number of scores currently memoized.
    pub fn cached_scores(&self) -> usize {
        self.cache().len()
    }

    /// Popularity of `number`; 0.0 for unknown numbers and numbers nobody called.
    pub fn popularity(&self, number: &str) -> f64 {
        let number = normalize_number(number);

        if let Some(&score) = self.cache().get(&number) {
            return score;
        }

        let Some(node) = self.node(&number) else {
            return 0.0;
        };

        let score = self.score(node);
        self.cache().insert(number, score);
        score
    }

    fn score(&self, node: &Node) -> f64 {
        let incoming = node.incoming_count();
        if incoming == 0 {
            return 0.0;
        }

        let call_score = incoming as f64 * CALL_WEIGHT;
        let duration_score = node.incoming_duration as f64 / 60.0 * MINUTE_WEIGHT;
        let direct_score = call_score + duration_score;

        // How often the callers themselves get called
        let caller_volume: usize = self
            .calls_of(&node.incoming)
            .map(|call| self.node(&call.source).map_or(0, Node::incoming_count))
            .sum();
        let bonus = caller_volume as f64 / incoming as f64 * CALLER_WEIGHT;

        direct_score + bonus
    }

    /// The `n` most popular numbers, highest score first.
    ///
    /// Equal scores keep node insertion order.
    pub fn top_n(&self, n: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .nodes
            .iter()
            .map(|node| (node.number.clone(), self.popularity(&node.number)))
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Calls of `number` in ascending timestamp order.
    ///
    /// With `other`, only calls between the two numbers (either direction);
    /// otherwise every incoming and outgoing call of `number`.
    pub fn call_history(&self, number: &str, other: Option<&str>) -> Vec<&Call> {
        let number = normalize_number(number);
        let Some(node) = self.node(&number) else {
            return Vec::new();
        };

        let other = other.map(normalize_number).filter(|o| !o.is_empty());

        let mut calls: Vec<&Call> = match other {
            Some(other) => self
                .calls_of(&node.outgoing)
                .filter(|call| call.destination == other)
                .chain(
                    self.calls_of(&node.incoming)
                        .filter(|call| call.source == other),
                )
                .collect(),
            None => self
                .calls_of(&node.incoming)
                .chain(self.calls_of(&node.outgoing))
                .collect(),
        };

        calls.sort_by_key(|call| call.timestamp);
        calls
    }
}
