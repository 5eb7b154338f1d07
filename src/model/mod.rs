pub mod builder;
pub mod corpus;
pub mod loader;
mod node;

pub use builder::ModelBuildParams;
pub use node::{Direction, NGramNode, NodeRef};

use crate::error::CfResult;
use node::Branch;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Pre-aggregated n-gram counts, keyed by the n-gram in reading order.
pub type NGramCounts = BTreeMap<String, u64>;

/// Immutable letter n-gram trie.
///
/// Nodes are stored per first letter in append-only arenas so each partition
/// can be built and normalized by its own worker. After `build` returns the
/// model is only ever read, and is shared across solver chains by reference.
#[derive(Debug, Clone)]
pub struct NGramModel {
    pub(crate) order: usize,
    pub(crate) direction: Direction,
    pub(crate) root_count: u64,
    pub(crate) unknown_probability: f64,
    pub(crate) unknown_log_probability: f64,
    pub(crate) branches: Vec<Branch>,
    pub(crate) root_children: Vec<(char, u32)>,
    pub(crate) depth_totals: Vec<u64>,
}

impl NGramModel {
    /// Forward model on the default pool.
    pub fn build(counts: NGramCounts, order: usize) -> CfResult<Self> {
        ModelBuildParams::builder()
            .counts(counts)
            .order(order)
            .build()
            .build_model()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Total first-order observations.
    pub fn root_count(&self) -> u64 {
        self.root_count
    }

    /// Smoothing floor used for every absent n-gram: 1 / root count.
    pub fn unknown_probability(&self) -> f64 {
        self.unknown_probability
    }

    pub fn unknown_log_probability(&self) -> f64 {
        self.unknown_log_probability
    }

    pub fn depth_total(&self, depth: usize) -> u64 {
        depth
            .checked_sub(1)
            .and_then(|d| self.depth_totals.get(d))
            .copied()
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.branches.iter().map(|b| b.nodes.len()).sum()
    }

    /// Letters with first-order observations, ascending.
    pub fn letters(&self) -> Vec<char> {
        self.root_children.iter().map(|&(c, _)| c).collect()
    }

    /// (letter, probability) for every first-order node, ascending by letter.
    pub fn unigram_distribution(&self) -> Vec<(char, f64)> {
        self.root_children
            .iter()
            .map(|&(c, b)| (c, self.branches[b as usize].nodes[0].probability))
            .collect()
    }

    pub fn node(&self, at: NodeRef) -> &NGramNode {
        &self.branches[at.branch as usize].nodes[at.slot as usize]
    }

    pub fn lookup_exact(&self, ngram: &str) -> Option<&NGramNode> {
        let found = match self.direction {
            Direction::Forward => self.descend(ngram.chars()),
            Direction::Backward => self.descend(ngram.chars().rev()),
        };
        found.map(|r| self.node(r))
    }

    /// Deepest node matching a prefix of `ngram` (a suffix for backward
    /// models). `None` only when the leading letter is unknown.
    pub fn lookup_longest_prefix(&self, ngram: &str) -> Option<&NGramNode> {
        let found = match self.direction {
            Direction::Forward => self.descend_longest(ngram.chars()),
            Direction::Backward => self.descend_longest(ngram.chars().rev()),
        };
        found.map(|r| self.node(r))
    }

    /// Children of a node, ascending by their next character.
    pub fn children(&self, at: NodeRef) -> impl Iterator<Item = (NodeRef, &NGramNode)> + '_ {
        let branch = &self.branches[at.branch as usize];
        branch.nodes[at.slot as usize]
            .children
            .iter()
            .map(move |&(_, slot)| {
                let r = NodeRef {
                    branch: at.branch,
                    slot,
                };
                (r, &branch.nodes[slot as usize])
            })
    }

    pub fn first_order_nodes(&self) -> impl Iterator<Item = (NodeRef, &NGramNode)> + '_ {
        self.root_children.iter().map(move |&(_, b)| {
            let r = NodeRef { branch: b, slot: 0 };
            (r, self.node(r))
        })
    }

    /// Every node in partition order.
    pub fn walk(&self) -> impl Iterator<Item = (NodeRef, &NGramNode)> + '_ {
        self.branches.iter().enumerate().flat_map(|(b, branch)| {
            branch.nodes.iter().enumerate().map(move |(s, node)| {
                let r = NodeRef {
                    branch: b as u32,
                    slot: s as u32,
                };
                (r, node)
            })
        })
    }

    /// Log-probability of one window (normally `order` chars ending at a
    /// decoded position). Absent n-grams score the smoothing floor.
    #[inline(always)]
    pub fn log_probability_of_window(&self, window: &[char]) -> f64 {
        let found = match self.direction {
            Direction::Forward => self.descend(window.iter().copied()),
            Direction::Backward => self.descend(window.iter().rev().copied()),
        };
        match found {
            Some(r) => self.node(r).log_probability,
            None => self.unknown_log_probability,
        }
    }

    /// Sum of `log_probability_of_window` over every full window of `text`,
    /// sliding along the precomputed transitions instead of descending from
    /// the root at each step.
    pub fn log_probability_of_text(&self, text: &[char]) -> f64 {
        let k = self.order;
        if text.len() < k {
            return 0.0;
        }
        let oriented: Cow<[char]> = match self.direction {
            Direction::Forward => Cow::Borrowed(text),
            Direction::Backward => Cow::Owned(text.iter().rev().copied().collect()),
        };

        let mut total = 0.0;
        let mut current: Option<NodeRef> = None;
        for end in k..=oriented.len() {
            let window = &oriented[end - k..end];
            let next = current.and_then(|r| self.node(r).transition(window[k - 1]));
            current = match next {
                Some(r) => Some(r),
                None => self.descend(window.iter().copied()),
            };
            total += match current {
                Some(r) => self.node(r).log_probability,
                None => self.unknown_log_probability,
            };
        }
        total
    }

    /// Exact descent over chars already in stored orientation.
    #[inline(always)]
    pub(crate) fn descend<I: Iterator<Item = char>>(&self, mut chars: I) -> Option<NodeRef> {
        let first = chars.next()?;
        let branch = self.branch_of(first)?;
        let nodes = &self.branches[branch as usize].nodes;
        let mut slot = 0u32;
        for c in chars {
            slot = nodes[slot as usize].child_slot(c)?;
        }
        Some(NodeRef { branch, slot })
    }

    fn descend_longest<I: Iterator<Item = char>>(&self, mut chars: I) -> Option<NodeRef> {
        let first = chars.next()?;
        let branch = self.branch_of(first)?;
        let nodes = &self.branches[branch as usize].nodes;
        let mut slot = 0u32;
        for c in chars {
            match nodes[slot as usize].child_slot(c) {
                Some(s) => slot = s,
                None => break,
            }
        }
        Some(NodeRef { branch, slot })
    }

    #[inline(always)]
    fn branch_of(&self, c: char) -> Option<u32> {
        self.root_children
            .binary_search_by_key(&c, |&(k, _)| k)
            .ok()
            .map(|i| self.root_children[i].1)
    }
}
