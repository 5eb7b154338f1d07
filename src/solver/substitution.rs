use crate::cipher::{Cipher, SymbolTable};
use crate::config::{IterationOrder, SolverConfig};
use crate::error::{CfResult, CipherForgeError};
use crate::model::NGramModel;
use crate::solver::anneal::AnnealingController;
use crate::solver::engine::{
    CancellationToken, DriverOutcome, EpochDriver, ProgressCallback, SearchProblem,
};
use crate::solver::oracle::KnownPlaintextOracle;
use crate::solver::roulette::RouletteSampler;
use crate::solver::solution::{CandidateSolution, SymbolProposal};
use fastrand::Rng;
use std::sync::Arc;
use tracing::info;

/// Monoalphabetic substitution as a search problem over full keys.
pub struct SubstitutionProblem<'a> {
    model: &'a NGramModel,
    table: Arc<SymbolTable>,
    letters: Vec<char>,
    sampler: RouletteSampler,
    pins: Vec<(u32, char)>,
    mutable_symbols: Vec<u32>,
    order: IterationOrder,
    oracle: Option<&'a dyn KnownPlaintextOracle>,
}

impl<'a> SubstitutionProblem<'a> {
    pub fn new(
        model: &'a NGramModel,
        cipher: &Cipher,
        config: &SolverConfig,
        oracle: Option<&'a dyn KnownPlaintextOracle>,
    ) -> CfResult<Self> {
        let mut table = SymbolTable::from_cipher(cipher);
        let letters = model.letters();

        let mut pins = Vec::new();
        for (symbol, letter) in config.parse_pins()? {
            let id = table.id_of(&symbol).ok_or_else(|| {
                CipherForgeError::Config(format!("pinned symbol '{}' is not in the cipher", symbol))
            })?;
            if !letters.contains(&letter) {
                return Err(CipherForgeError::Config(format!(
                    "pinned letter '{}' is not in the model alphabet",
                    letter
                )));
            }
            table.lock(id);
            pins.push((id, letter));
        }

        let mutable_symbols: Vec<u32> = (0..table.key_size() as u32)
            .filter(|&id| !table.is_locked(id))
            .collect();

        let sampler = RouletteSampler::new(&model.unigram_distribution(), config.letter_flattening)?;

        Ok(Self {
            model,
            table: Arc::new(table),
            letters,
            sampler,
            pins,
            mutable_symbols,
            order: config.iteration_order,
            oracle,
        })
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }
}

impl SearchProblem for SubstitutionProblem<'_> {
    type State = CandidateSolution;

    fn initial_state(&self, rng: &mut Rng) -> CfResult<CandidateSolution> {
        let mut mapping: Vec<char> = (0..self.table.key_size())
            .map(|_| self.sampler.sample(rng))
            .collect();
        for &(id, letter) in &self.pins {
            mapping[id as usize] = letter;
        }
        Ok(CandidateSolution::new(self.table.clone(), mapping, self.model))
    }

    fn score(&self, state: &CandidateSolution) -> f64 {
        state.combined_score()
    }

    fn sweep(
        &self,
        state: CandidateSolution,
        temperature: f64,
        controller: &AnnealingController,
        rng: &mut Rng,
    ) -> CfResult<CandidateSolution> {
        let mut visit = self.mutable_symbols.clone();
        if self.order == IterationOrder::Randomized {
            rng.shuffle(&mut visit);
        }

        let mut current = state;
        let mut proposal = SymbolProposal::default();
        for symbol in visit {
            let letter = self.letters[rng.usize(..self.letters.len())];
            if letter == current.letter_for(symbol) {
                continue;
            }

            current.propose(symbol, letter, self.model, &mut proposal);
            if controller.decide(
                current.combined_score(),
                proposal.combined_score(),
                temperature,
                rng,
            )? {
                current.commit(&proposal);
            }
        }
        Ok(current)
    }

    fn proximity(&self, state: &CandidateSolution) -> Option<f64> {
        self.oracle.map(|o| o.proximity(&state.decode()))
    }
}

/// Checks that a cipher, model and configuration can run together. Nothing
/// is allocated for the search until this passes.
pub fn validate_setup(
    cipher: &Cipher,
    model: &NGramModel,
    config: &SolverConfig,
    has_oracle: bool,
) -> CfResult<()> {
    config.validate()?;
    if config.model_order != model.order() {
        return Err(CipherForgeError::Config(format!(
            "configured model order {} does not match the loaded model order {}",
            config.model_order,
            model.order()
        )));
    }
    if cipher.len() < model.order() {
        return Err(CipherForgeError::Config(format!(
            "cipher length {} is shorter than the model order {}",
            cipher.len(),
            model.order()
        )));
    }
    if config.use_known_oracle && !has_oracle {
        return Err(CipherForgeError::Config(
            "known-plaintext oracle requested but none was supplied".to_string(),
        ));
    }
    Ok(())
}

/// Runs the configured epochs over `cipher` and returns the raw driver
/// outcome. `oracle` is ignored unless `use_known_oracle` is set.
pub fn search_substitution<CB: ProgressCallback>(
    cipher: &Cipher,
    model: &NGramModel,
    config: &SolverConfig,
    oracle: Option<&dyn KnownPlaintextOracle>,
    cancel: &CancellationToken,
    callback: &CB,
) -> CfResult<DriverOutcome<CandidateSolution>> {
    validate_setup(cipher, model, config, oracle.is_some())?;
    let oracle = if config.use_known_oracle { oracle } else { None };

    let problem = SubstitutionProblem::new(model, cipher, config, oracle)?;
    info!(
        "Solving '{}': {} symbols over {} positions, {} epochs x {} iterations",
        cipher.name,
        problem.table().key_size(),
        cipher.len(),
        config.epochs,
        config.sampler_iterations
    );

    let driver = EpochDriver::new(&problem, AnnealingController::from(config), config.epochs)
        .with_threads(config.resolved_threads())
        .with_seed(config.seed)
        .with_cancellation(cancel.clone());
    driver.run(callback)
}
