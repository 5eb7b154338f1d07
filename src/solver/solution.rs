use crate::cipher::SymbolTable;
use crate::model::NGramModel;
use fnv::FnvHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Exponent applied to the index of coincidence before it scales the
/// aggregate log-probability.
pub const COINCIDENCE_ROOT: f64 = 1.0 / 5.0;

/// A full symbol -> letter key with its decoding and cached window scores.
///
/// Every field that a change may touch sits behind an `Arc` and is copied
/// on first write, so `clone` is cheap and a mutated clone never disturbs
/// the original. The search scores changes with [`CandidateSolution::propose`]
/// and writes only the accepted ones.
#[derive(Debug, Clone)]
pub struct CandidateSolution {
    table: Arc<SymbolTable>,
    mapping: Arc<Vec<char>>,
    decoded: Arc<Vec<char>>,
    // One entry per position: log-probability of the window ending there,
    // 0.0 before the first full window.
    windows: Arc<Vec<f64>>,
    letter_counts: Arc<FnvHashMap<char, usize>>,
    log_probability: f64,
    score: f64,
}

/// A single-symbol change scored against an unchanged [`CandidateSolution`].
#[derive(Debug, Clone, Default)]
pub struct SymbolProposal {
    symbol: u32,
    letter: char,
    // (window end, new log-probability) for every window the change touches.
    windows: Vec<(usize, f64)>,
    window: Vec<char>,
    log_probability: f64,
    score: f64,
}

impl SymbolProposal {
    pub fn symbol(&self) -> u32 {
        self.symbol
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    pub fn combined_score(&self) -> f64 {
        self.score
    }
}

impl CandidateSolution {
    /// `mapping[id]` is the letter for symbol `id`. Scores the whole
    /// decoding from scratch.
    pub fn new(table: Arc<SymbolTable>, mapping: Vec<char>, model: &NGramModel) -> Self {
        let decoded: Vec<char> = table.ids().iter().map(|&id| mapping[id as usize]).collect();
        let mut letter_counts: FnvHashMap<char, usize> = FnvHashMap::default();
        for &c in &decoded {
            *letter_counts.entry(c).or_insert(0) += 1;
        }
        let windows = vec![0.0; decoded.len()];

        let mut solution = Self {
            table,
            mapping: Arc::new(mapping),
            decoded: Arc::new(decoded),
            windows: Arc::new(windows),
            letter_counts: Arc::new(letter_counts),
            log_probability: 0.0,
            score: 0.0,
        };
        solution.rescore_full(model);
        solution
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn decode(&self) -> String {
        self.decoded.iter().collect()
    }

    pub fn decoded_chars(&self) -> &[char] {
        &self.decoded
    }

    pub fn mapping(&self) -> &[char] {
        &self.mapping
    }

    pub fn letter_for(&self, symbol: u32) -> char {
        self.mapping[symbol as usize]
    }

    pub fn mapping_by_symbol(&self) -> BTreeMap<String, char> {
        self.table
            .symbols()
            .iter()
            .zip(self.mapping.iter())
            .map(|(s, &c)| (s.clone(), c))
            .collect()
    }

    pub fn window_log_probabilities(&self) -> &[f64] {
        &self.windows
    }

    /// Running total of every window log-probability.
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    /// Index of coincidence of the decoded text. Texts shorter than two
    /// letters have no pairs and report 1.0.
    pub fn coincidence(&self) -> f64 {
        let n = self.decoded.len();
        if n < 2 {
            return 1.0;
        }
        let pairs: usize = self.letter_counts.values().map(|&c| c * c.saturating_sub(1)).sum();
        pairs as f64 / (n * (n - 1)) as f64
    }

    /// `log_probability * coincidence^(1/5)`; higher is better.
    pub fn combined_score(&self) -> f64 {
        self.score
    }

    /// Points `symbol` at `letter` and updates the decoding. Window scores
    /// are stale until one of the rescore methods runs.
    pub fn reassign(&mut self, symbol: u32, letter: char) {
        let previous = self.mapping[symbol as usize];
        if previous == letter {
            return;
        }
        Arc::make_mut(&mut self.mapping)[symbol as usize] = letter;

        let decoded = Arc::make_mut(&mut self.decoded);
        let positions = self.table.positions(symbol);
        for &p in positions {
            decoded[p] = letter;
        }

        let counts = Arc::make_mut(&mut self.letter_counts);
        let moved = positions.len();
        if let Some(c) = counts.get_mut(&previous) {
            *c -= moved;
            if *c == 0 {
                counts.remove(&previous);
            }
        }
        *counts.entry(letter).or_insert(0) += moved;
    }

    /// Recomputes only the windows covering a position of `symbol`.
    pub fn rescore_after_single_symbol_change(&mut self, symbol: u32, model: &NGramModel) {
        let k = model.order();
        if self.decoded.len() < k {
            self.refresh_score();
            return;
        }

        let n = self.decoded.len();
        let windows = Arc::make_mut(&mut self.windows);
        let mut delta = 0.0;
        for e in window_ends(self.table.positions(symbol), n, k) {
            let lp = model.log_probability_of_window(&self.decoded[e + 1 - k..=e]);
            delta += lp - windows[e];
            windows[e] = lp;
        }

        self.log_probability += delta;
        self.refresh_score();
    }

    /// Scores "point `symbol` at `letter`" without touching `self`. The
    /// result lands in `proposal`, whose buffers are reused across calls;
    /// apply it with [`CandidateSolution::commit`].
    pub fn propose(
        &self,
        symbol: u32,
        letter: char,
        model: &NGramModel,
        proposal: &mut SymbolProposal,
    ) {
        proposal.symbol = symbol;
        proposal.letter = letter;
        proposal.windows.clear();

        let previous = self.mapping[symbol as usize];
        let moved = self.table.positions(symbol).len();
        let coincidence = if previous == letter {
            self.coincidence()
        } else {
            self.coincidence_after_move(previous, letter, moved)
        };

        let k = model.order();
        let mut delta = 0.0;
        if previous != letter && self.decoded.len() >= k {
            let ids = self.table.ids();
            for e in window_ends(self.table.positions(symbol), self.decoded.len(), k) {
                proposal.window.clear();
                proposal.window.extend((e + 1 - k..=e).map(|i| {
                    if ids[i] == symbol {
                        letter
                    } else {
                        self.decoded[i]
                    }
                }));
                let lp = model.log_probability_of_window(&proposal.window);
                delta += lp - self.windows[e];
                proposal.windows.push((e, lp));
            }
        }

        proposal.log_probability = self.log_probability + delta;
        proposal.score = proposal.log_probability * coincidence.powf(COINCIDENCE_ROOT);
    }

    /// Applies a proposal made against this exact state.
    pub fn commit(&mut self, proposal: &SymbolProposal) {
        self.reassign(proposal.symbol, proposal.letter);
        if !proposal.windows.is_empty() {
            let windows = Arc::make_mut(&mut self.windows);
            for &(e, lp) in &proposal.windows {
                windows[e] = lp;
            }
        }
        self.log_probability = proposal.log_probability;
        self.score = proposal.score;
    }

    /// True when every copy-on-write buffer is still shared with `other`.
    pub fn shares_buffers_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mapping, &other.mapping)
            && Arc::ptr_eq(&self.decoded, &other.decoded)
            && Arc::ptr_eq(&self.windows, &other.windows)
            && Arc::ptr_eq(&self.letter_counts, &other.letter_counts)
    }

    fn coincidence_after_move(&self, from: char, to: char, moved: usize) -> f64 {
        let n = self.decoded.len();
        if n < 2 {
            return 1.0;
        }
        let pairs = |c: usize| c * c.saturating_sub(1);
        let count = |l: char| self.letter_counts.get(&l).copied().unwrap_or(0);
        let (a, b) = (count(from), count(to));
        let total: usize = self.letter_counts.values().map(|&c| pairs(c)).sum();
        let total = total - pairs(a) - pairs(b) + pairs(a - moved) + pairs(b + moved);
        total as f64 / (n * (n - 1)) as f64
    }

    pub fn rescore_full(&mut self, model: &NGramModel) {
        let k = model.order();
        let windows = Arc::make_mut(&mut self.windows);
        let mut total = 0.0;
        for e in 0..self.decoded.len() {
            windows[e] = if e + 1 >= k {
                model.log_probability_of_window(&self.decoded[e + 1 - k..=e])
            } else {
                0.0
            };
            total += windows[e];
        }
        self.log_probability = total;
        self.refresh_score();
    }

    fn refresh_score(&mut self) {
        self.score = self.log_probability * self.coincidence().powf(COINCIDENCE_ROOT);
    }
}

/// Ends of the windows that contain any of `positions`, ascending and
/// without repeats. `positions` must be ascending and `n >= k`.
fn window_ends(positions: &[usize], n: usize, k: usize) -> impl Iterator<Item = usize> + '_ {
    let mut next = k - 1;
    positions.iter().flat_map(move |&p| {
        let start = p.max(next);
        let end = (p + k - 1).min(n - 1);
        next = next.max(end + 1);
        start..=end
    })
}
