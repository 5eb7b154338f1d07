use crate::cipher::{transposition, Cipher};
use crate::config::{SolverConfig, TranspositionConfig};
use crate::error::CfResult;
use crate::model::NGramModel;
use crate::solver::engine::{
    CancellationToken, EpochSummary, NoProgress, ProgressCallback, Scored,
};
use crate::solver::oracle::KnownPlaintextOracle;
use crate::solver::solution::CandidateSolution;
use crate::solver::substitution::search_substitution;
use crate::solver::transposition::search_transposition;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSolution {
    pub plaintext: String,
    pub mapping: BTreeMap<String, char>,
    pub score: f64,
    pub log_probability: f64,
    pub coincidence: f64,
    pub epoch: usize,
    pub iteration: usize,
}

impl From<&Scored<CandidateSolution>> for DecodedSolution {
    fn from(scored: &Scored<CandidateSolution>) -> Self {
        let s = &scored.state;
        Self {
            plaintext: s.decode(),
            mapping: s.mapping_by_symbol(),
            score: scored.score,
            log_probability: s.log_probability(),
            coincidence: s.coincidence(),
            epoch: scored.epoch,
            iteration: scored.iteration,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OracleBest {
    #[serde(flatten)]
    pub solution: DecodedSolution,
    pub proximity: f64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResult {
    pub cipher_name: String,
    pub best: DecodedSolution,
    pub oracle_best: Option<OracleBest>,
    pub epochs: Vec<EpochSummary>,
    pub cancelled: bool,
}

impl SolutionResult {
    pub fn decoded(&self) -> &str {
        &self.best.plaintext
    }

    pub fn mapping(&self) -> &BTreeMap<String, char> {
        &self.best.mapping
    }

    pub fn score(&self) -> f64 {
        self.best.score
    }
}

/// Substitution solver bound to one model and configuration.
pub struct Solver<'a> {
    model: &'a NGramModel,
    config: SolverConfig,
    oracle: Option<&'a dyn KnownPlaintextOracle>,
    cancel: CancellationToken,
}

impl<'a> Solver<'a> {
    pub fn new(model: &'a NGramModel, config: SolverConfig) -> Self {
        Self {
            model,
            config,
            oracle: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_oracle(mut self, oracle: &'a dyn KnownPlaintextOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, cipher: &Cipher) -> CfResult<SolutionResult> {
        self.solve_with_progress(cipher, &NoProgress)
    }

    pub fn solve_with_progress<CB: ProgressCallback>(
        &self,
        cipher: &Cipher,
        callback: &CB,
    ) -> CfResult<SolutionResult> {
        let outcome = search_substitution(
            cipher,
            self.model,
            &self.config,
            self.oracle,
            &self.cancel,
            callback,
        )?;

        Ok(SolutionResult {
            cipher_name: cipher.name.clone(),
            best: DecodedSolution::from(&outcome.best),
            oracle_best: outcome.proximity_best.as_ref().map(|p| OracleBest {
                solution: DecodedSolution::from(&p.best),
                proximity: p.proximity,
            }),
            epochs: outcome.epochs,
            cancelled: outcome.cancelled,
        })
    }
}

/// Solves a monoalphabetic substitution against a prebuilt model.
pub fn solve(cipher: &Cipher, model: &NGramModel, config: &SolverConfig) -> CfResult<SolutionResult> {
    Solver::new(model, config.clone()).solve(cipher)
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct KeyLengthSummary {
    pub key_length: usize,
    pub key_permutation: Vec<usize>,
    pub bigram_score: f64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TranspositionResult {
    pub key_permutation: Vec<usize>,
    pub bigram_score: f64,
    pub key_length: usize,
    pub candidates: Vec<KeyLengthSummary>,
    pub cancelled: bool,
}

impl TranspositionResult {
    /// The cipher with the recovered key undone.
    pub fn apply(&self, cipher: &Cipher) -> Cipher {
        cipher.with_ciphertext(transposition::unwrap(
            &cipher.ciphertext,
            &self.key_permutation,
        ))
    }
}

pub fn solve_transposition_key(
    cipher: &Cipher,
    config: &TranspositionConfig,
) -> CfResult<TranspositionResult> {
    solve_transposition_key_with(cipher, config, &CancellationToken::new(), &NoProgress)
}

/// Best key over every configured length. Ties go to the shorter key.
pub fn solve_transposition_key_with<CB: ProgressCallback>(
    cipher: &Cipher,
    config: &TranspositionConfig,
    cancel: &CancellationToken,
    callback: &CB,
) -> CfResult<TranspositionResult> {
    let per_length = search_transposition(cipher, config, cancel, callback)?;

    let mut candidates = Vec::with_capacity(per_length.len());
    let mut best: Option<&KeyLengthSummary> = None;
    let mut cancelled = false;

    for r in &per_length {
        cancelled |= r.cancelled;
        candidates.push(KeyLengthSummary {
            key_length: r.key_length,
            key_permutation: r.key.permutation.clone(),
            bigram_score: r.key.score,
        });
    }
    for c in &candidates {
        if best.map_or(true, |b| c.bigram_score > b.bigram_score) {
            best = Some(c);
        }
    }

    let (key_permutation, bigram_score, key_length) = match best {
        Some(b) => (b.key_permutation.clone(), b.bigram_score, b.key_length),
        None => (Vec::new(), 0.0, 0),
    };

    Ok(TranspositionResult {
        key_permutation,
        bigram_score,
        key_length,
        candidates,
        cancelled,
    })
}
