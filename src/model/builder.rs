use crate::error::{CfResult, CipherForgeError};
use crate::model::node::{Branch, Direction, NGramNode, NodeRef};
use crate::model::{NGramCounts, NGramModel};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct ModelBuildParams {
    pub counts: NGramCounts,
    pub order: usize,
    #[builder(default)]
    pub direction: Direction,
    // 0 = one worker per available core
    #[builder(default = 0)]
    pub threads: usize,
}

impl ModelBuildParams {
    pub fn build_model(self) -> CfResult<NGramModel> {
        let order = self.order;
        let direction = self.direction;
        if order == 0 {
            return Err(CipherForgeError::Config(
                "model order must be at least 1".to_string(),
            ));
        }

        let mut pool_builder = rayon::ThreadPoolBuilder::new();
        if self.threads > 0 {
            pool_builder = pool_builder.num_threads(self.threads);
        }
        let pool = pool_builder.build()?;

        // 1. Partition by first letter
        let mut groups: BTreeMap<char, Vec<(Vec<char>, u64)>> = BTreeMap::new();
        let mut skipped = 0usize;
        for (key, count) in self.counts {
            let chars = direction.orient(&key);
            if chars.is_empty() || chars.len() > order {
                skipped += 1;
                continue;
            }
            groups.entry(chars[0]).or_default().push((chars, count));
        }
        if skipped > 0 {
            debug!("Skipped {} n-grams outside orders 1..={}", skipped, order);
        }

        let groups: Vec<(char, Vec<(Vec<char>, u64)>)> = groups.into_iter().collect();
        let root_children: Vec<(char, u32)> = groups
            .iter()
            .enumerate()
            .map(|(i, (c, _))| (*c, i as u32))
            .collect();

        // 2. Grow one partition per task
        let branches: Vec<Branch> = pool.install(|| {
            groups
                .into_par_iter()
                .map(|(first, entries)| grow_branch(first, entries))
                .collect()
        });

        // 3. Depth totals
        let depth_totals = branches
            .iter()
            .map(|b| branch_depth_totals(b, order))
            .fold(vec![0u64; order], |mut acc, totals| {
                for (a, t) in acc.iter_mut().zip(totals) {
                    *a += t;
                }
                acc
            });

        let root_count = depth_totals[0];
        if root_count == 0 {
            return Err(CipherForgeError::Data(
                "n-gram dataset has no first-order observations".to_string(),
            ));
        }
        for (d, &total) in depth_totals.iter().enumerate() {
            if total == 0 {
                warn!("No n-grams observed at order {}", d + 1);
            }
        }

        let unknown_probability = 1.0 / root_count as f64;
        let mut model = NGramModel {
            order,
            direction,
            root_count,
            unknown_probability,
            unknown_log_probability: unknown_probability.ln(),
            branches,
            root_children,
            depth_totals,
        };

        // 4. Linking: computed against the read-only tree, then applied
        let links: Vec<Vec<(usize, Vec<(char, NodeRef)>)>> = pool.install(|| {
            model
                .branches
                .par_iter()
                .map(|b| compute_links(&model, b))
                .collect()
        });

        // 5. Normalization
        let totals = model.depth_totals.clone();
        let unknown_log = model.unknown_log_probability;
        pool.install(|| {
            model
                .branches
                .par_iter_mut()
                .zip(links)
                .for_each(|(branch, branch_links)| {
                    for (slot, transitions) in branch_links {
                        branch.nodes[slot].transitions = transitions;
                    }
                    normalize_branch(branch, &totals, root_count, unknown_log);
                });
        });

        info!(
            "N-gram model ready: order={}, direction={}, nodes={}, root count={}",
            order,
            direction,
            model.node_count(),
            root_count
        );

        Ok(model)
    }
}

fn grow_branch(first: char, entries: Vec<(Vec<char>, u64)>) -> Branch {
    let mut nodes = vec![NGramNode::new(first.to_string(), 1)];
    let mut observed = vec![false];

    for (chars, count) in entries {
        let mut slot = 0usize;
        for depth in 1..chars.len() {
            let c = chars[depth];
            slot = match nodes[slot].child_slot(c) {
                Some(s) => s as usize,
                None => {
                    let s = nodes.len();
                    let ngram: String = chars[..=depth].iter().collect();
                    nodes.push(NGramNode::new(ngram, depth + 1));
                    observed.push(false);
                    nodes[slot].insert_child(c, s as u32);
                    s
                }
            };
        }
        nodes[slot].count += count;
        observed[slot] = true;
    }

    // Children always sit after their parent, so a reverse sweep sees every
    // child total before the parent needs it.
    for slot in (0..nodes.len()).rev() {
        if !observed[slot] {
            let derived: u64 = nodes[slot]
                .children
                .iter()
                .map(|&(_, s)| nodes[s as usize].count)
                .sum();
            nodes[slot].count = derived;
        }
    }

    Branch { nodes }
}

fn branch_depth_totals(branch: &Branch, order: usize) -> Vec<u64> {
    let mut totals = vec![0u64; order];
    for node in &branch.nodes {
        totals[node.depth - 1] += node.count;
    }
    totals
}

fn compute_links(model: &NGramModel, branch: &Branch) -> Vec<(usize, Vec<(char, NodeRef)>)> {
    let order = model.order;
    let letters: Vec<char> = model.root_children.iter().map(|&(c, _)| c).collect();
    let mut out = Vec::new();
    let mut key: Vec<char> = Vec::with_capacity(order);

    for (slot, node) in branch.nodes.iter().enumerate() {
        if node.depth != order {
            continue;
        }
        key.clear();
        key.extend(node.ngram.chars().skip(1));
        let mut transitions = Vec::new();
        for &letter in &letters {
            key.push(letter);
            if let Some(target) = model.descend(key.iter().copied()) {
                transitions.push((letter, target));
            }
            key.pop();
        }
        if !transitions.is_empty() {
            out.push((slot, transitions));
        }
    }
    out
}

fn normalize_branch(branch: &mut Branch, totals: &[u64], root_count: u64, unknown_log: f64) {
    let mut conditional: Vec<(usize, f64)> = Vec::new();

    for node in &branch.nodes {
        let sibling_total: u64 = node
            .children
            .iter()
            .map(|&(_, s)| branch.nodes[s as usize].count)
            .sum();
        if sibling_total == 0 {
            continue;
        }
        for &(_, s) in &node.children {
            let child = &branch.nodes[s as usize];
            conditional.push((s as usize, child.count as f64 / sibling_total as f64));
        }
    }

    for (slot, node) in branch.nodes.iter_mut().enumerate() {
        let total = totals[node.depth - 1];
        node.probability = if total > 0 {
            node.count as f64 / total as f64
        } else {
            0.0
        };
        node.log_probability = if node.probability > 0.0 {
            node.probability.ln()
        } else {
            unknown_log
        };
        if slot == 0 {
            node.conditional_probability = Some(node.count as f64 / root_count as f64);
        }
    }

    for (slot, p) in conditional {
        branch.nodes[slot].conditional_probability = Some(p);
    }
}
