use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Address of a node: the first-letter partition it lives in and its slot in
/// that partition's append-only arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub(crate) branch: u32,
    pub(crate) slot: u32,
}

/// Which way n-gram keys are threaded through the trie.
///
/// A backward model stores every key reversed and reverses every query, so
/// exact lookups and window scores are identical in both directions while
/// prefix queries match suffixes instead.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn orient(self, key: &str) -> Vec<char> {
        match self {
            Direction::Forward => key.chars().collect(),
            Direction::Backward => key.chars().rev().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NGramNode {
    pub(crate) ngram: String,
    pub(crate) depth: usize,
    pub(crate) count: u64,
    pub(crate) probability: f64,
    pub(crate) conditional_probability: Option<f64>,
    pub(crate) log_probability: f64,
    // Sorted by char; slots index the same partition.
    pub(crate) children: Vec<(char, u32)>,
    // Only populated on nodes at the model order: the node reached by
    // dropping the first character and appending the key char.
    pub(crate) transitions: Vec<(char, NodeRef)>,
}

impl NGramNode {
    pub(crate) fn new(ngram: String, depth: usize) -> Self {
        Self {
            ngram,
            depth,
            count: 0,
            probability: 0.0,
            conditional_probability: None,
            log_probability: f64::NEG_INFINITY,
            children: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// The n-gram in stored orientation (reversed for backward models).
    pub fn ngram(&self) -> &str {
        &self.ngram
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Count divided by the total count of every node at this depth.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Count divided by the summed counts of this node and its siblings.
    pub fn conditional_probability(&self) -> Option<f64> {
        self.conditional_probability
    }

    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    #[inline(always)]
    pub(crate) fn child_slot(&self, c: char) -> Option<u32> {
        self.children
            .binary_search_by_key(&c, |&(k, _)| k)
            .ok()
            .map(|i| self.children[i].1)
    }

    pub(crate) fn insert_child(&mut self, c: char, slot: u32) {
        if let Err(pos) = self.children.binary_search_by_key(&c, |&(k, _)| k) {
            self.children.insert(pos, (c, slot));
        }
    }

    #[inline(always)]
    pub(crate) fn transition(&self, c: char) -> Option<NodeRef> {
        self.transitions
            .binary_search_by_key(&c, |&(k, _)| k)
            .ok()
            .map(|i| self.transitions[i].1)
    }
}

/// One first-letter subtree. Slot 0 is the first-order node; every child is
/// appended after its parent.
#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub(crate) nodes: Vec<NGramNode>,
}
