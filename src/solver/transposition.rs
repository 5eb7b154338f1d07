use crate::cipher::transposition::unwrap_into;
use crate::cipher::{Cipher, SymbolTable};
use crate::config::TranspositionConfig;
use crate::error::CfResult;
use crate::solver::anneal::AnnealingController;
use crate::solver::engine::{CancellationToken, EpochDriver, ProgressCallback, SearchProblem};
use fastrand::Rng;
use fnv::FnvHashMap;
use rayon::prelude::*;
use std::hash::Hash;
use tracing::info;

/// Number of adjacent pairs that repeat an earlier pair: the sum of
/// `count - 1` over every distinct bigram. Plain text repeats far more
/// bigrams than text with its columns shuffled.
pub fn bigram_repeats<T: Eq + Hash + Copy>(tokens: &[T]) -> usize {
    if tokens.len() < 2 {
        return 0;
    }
    let mut counts: FnvHashMap<(T, T), usize> = FnvHashMap::default();
    for pair in tokens.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts.values().map(|&c| c - 1).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranspositionKey {
    pub permutation: Vec<usize>,
    pub score: f64,
}

/// Column-permutation search for one key length, scored by bigram repeats
/// of the unwrapped ciphertext.
pub struct TranspositionProblem {
    ids: Vec<u32>,
    key_length: usize,
}

impl TranspositionProblem {
    pub fn new(ids: Vec<u32>, key_length: usize) -> Self {
        Self { ids, key_length }
    }

    pub fn evaluate(&self, permutation: &[usize]) -> f64 {
        let mut scratch = vec![0; self.ids.len()];
        self.evaluate_into(permutation, &mut scratch)
    }

    /// `evaluate` using a caller-owned buffer as long as the ciphertext.
    pub fn evaluate_into(&self, permutation: &[usize], scratch: &mut [u32]) -> f64 {
        unwrap_into(&self.ids, permutation, scratch);
        bigram_repeats(scratch) as f64
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }
}

/// Tags every epoch report with the key length its chain is searching.
struct KeyLengthProgress<'a, CB> {
    key_length: usize,
    inner: &'a CB,
}

impl<CB: ProgressCallback> ProgressCallback for KeyLengthProgress<'_, CB> {
    fn on_epoch_complete(&self, epoch: usize, best_score: f64) -> bool {
        self.inner
            .on_key_length_epoch_complete(self.key_length, epoch, best_score)
    }
}

impl SearchProblem for TranspositionProblem {
    type State = TranspositionKey;

    fn initial_state(&self, rng: &mut Rng) -> CfResult<TranspositionKey> {
        let mut permutation: Vec<usize> = (0..self.key_length).collect();
        rng.shuffle(&mut permutation);
        let score = self.evaluate(&permutation);
        Ok(TranspositionKey { permutation, score })
    }

    fn score(&self, state: &TranspositionKey) -> f64 {
        state.score
    }

    /// Tries every pairwise swap of the starting key. Each swap is judged
    /// against the best key accepted so far in this sweep, which becomes the
    /// new state.
    fn sweep(
        &self,
        state: TranspositionKey,
        temperature: f64,
        controller: &AnnealingController,
        rng: &mut Rng,
    ) -> CfResult<TranspositionKey> {
        let k = self.key_length;
        let mut best = state.clone();
        let mut candidate = state.permutation.clone();
        let mut scratch = vec![0; self.ids.len()];
        for i in 0..k {
            for j in (i + 1)..k {
                candidate.copy_from_slice(&state.permutation);
                candidate.swap(i, j);
                let score = self.evaluate_into(&candidate, &mut scratch);
                if controller.decide(best.score, score, temperature, rng)? {
                    best.permutation.copy_from_slice(&candidate);
                    best.score = score;
                }
            }
        }
        Ok(best)
    }
}

#[derive(Debug, Clone)]
pub struct KeyLengthBest {
    pub key_length: usize,
    pub key: TranspositionKey,
    pub cancelled: bool,
}

/// Searches every key length in `key_length_min..=key_length_max` in
/// parallel and returns the best key per length, shortest first.
pub fn search_transposition<CB: ProgressCallback>(
    cipher: &Cipher,
    config: &TranspositionConfig,
    cancel: &CancellationToken,
    callback: &CB,
) -> CfResult<Vec<KeyLengthBest>> {
    config.validate(cipher.len())?;
    let solver = &config.solver;
    let table = SymbolTable::from_cipher(cipher);
    let lengths: Vec<usize> = (config.key_length_min..=config.key_length_max).collect();

    info!(
        "Searching transposition keys of length {}..={} over {} symbols",
        config.key_length_min,
        config.key_length_max,
        cipher.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(solver.resolved_threads())
        .build()?;

    pool.install(|| {
        lengths
            .par_iter()
            .map(|&key_length| -> CfResult<KeyLengthBest> {
                let problem = TranspositionProblem::new(table.ids().to_vec(), key_length);
                // Distinct RNG streams per key length
                let seed = solver
                    .seed
                    .map(|s| s.wrapping_add((key_length as u64) << 32));
                let progress = KeyLengthProgress {
                    key_length,
                    inner: callback,
                };
                let outcome = EpochDriver::new(&problem, AnnealingController::from(solver), solver.epochs)
                    .with_seed(seed)
                    .with_cancellation(cancel.clone())
                    .run(&progress)?;

                info!(
                    "Key length {}: best {:?} with {} repeated bigrams",
                    key_length, outcome.best.state.permutation, outcome.best.score
                );
                Ok(KeyLengthBest {
                    key_length,
                    key: outcome.best.state,
                    cancelled: outcome.cancelled,
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use std::sync::Mutex;

    #[test]
    fn repeats_count_every_extra_occurrence() {
        let text: Vec<char> = "thethe".chars().collect();
        // th x2, he x2, et x1
        assert_eq!(bigram_repeats(&text), 2);
        assert_eq!(bigram_repeats(&['a']), 0);
    }

    #[test]
    fn evaluate_into_matches_evaluate_with_a_reused_buffer() {
        let ids: Vec<u32> = "attackatdawnattackatdusk".bytes().map(|b| b as u32).collect();
        let problem = TranspositionProblem::new(ids.clone(), 4);
        let mut scratch = vec![0; ids.len()];
        for key in [[0, 1, 2, 3], [3, 1, 0, 2], [2, 0, 3, 1]] {
            assert_eq!(problem.evaluate_into(&key, &mut scratch), problem.evaluate(&key));
        }
    }

    struct Recorder(Mutex<Vec<(usize, usize)>>);

    impl ProgressCallback for Recorder {
        fn on_epoch_complete(&self, _epoch: usize, _best_score: f64) -> bool {
            panic!("key length searches report through on_key_length_epoch_complete");
        }

        fn on_key_length_epoch_complete(
            &self,
            key_length: usize,
            epoch: usize,
            _best_score: f64,
        ) -> bool {
            self.0.lock().unwrap().push((key_length, epoch));
            true
        }
    }

    #[test]
    fn epoch_reports_carry_their_key_length() {
        let cipher = Cipher::from_chars("c", &"wearediscoveredfleeatonce".repeat(4));
        let config = TranspositionConfig {
            solver: SolverConfig {
                sampler_iterations: 5,
                epochs: 3,
                threads: 2,
                seed: Some(1),
                ..Default::default()
            },
            key_length_min: 2,
            key_length_max: 4,
        };
        let recorder = Recorder(Mutex::new(Vec::new()));
        search_transposition(&cipher, &config, &CancellationToken::new(), &recorder).unwrap();

        let mut seen = recorder.0.into_inner().unwrap();
        seen.sort_unstable();
        let expected: Vec<(usize, usize)> = (2..=4)
            .flat_map(|k| (0..3).map(move |e| (k, e)))
            .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn sweep_never_returns_a_worse_key_when_cold() {
        let ids: Vec<u32> = "thequickbrownfoxjumpsoverthelazydogthequickbrownfox"
            .bytes()
            .map(|b| b as u32)
            .collect();
        let problem = TranspositionProblem::new(ids, 5);
        let controller = AnnealingController::new(0.0, 0.0, 1);
        let mut rng = Rng::with_seed(3);
        let start = problem.initial_state(&mut rng).unwrap();
        let next = problem.sweep(start.clone(), 0.0, &controller, &mut rng).unwrap();
        assert!(next.score >= start.score);
        let mut sorted = next.permutation.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }
}
