use crate::error::{CfResult, CipherForgeError};
use crate::solver::anneal::AnnealingController;
use fastrand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative stop signal shared between a caller and running chains.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub trait ProgressCallback: Send + Sync {
    /// Called once per finished epoch. Returning false cancels the run.
    fn on_epoch_complete(&self, epoch: usize, best_score: f64) -> bool;

    /// Epoch report from a search that runs one set of epochs per key
    /// length, so `epoch` alone repeats across lengths.
    fn on_key_length_epoch_complete(
        &self,
        _key_length: usize,
        epoch: usize,
        best_score: f64,
    ) -> bool {
        self.on_epoch_complete(epoch, best_score)
    }
}

pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_epoch_complete(&self, _epoch: usize, _best_score: f64) -> bool {
        true
    }
}

/// What the driver needs from a concrete search: a state, a way to draw a
/// fresh one, its score (higher is better), and one full sampler iteration.
pub trait SearchProblem: Sync {
    type State: Clone + Send;

    fn initial_state(&self, rng: &mut Rng) -> CfResult<Self::State>;

    fn score(&self, state: &Self::State) -> f64;

    /// One iteration at a fixed temperature. Every accept/reject inside it
    /// must go through `controller.decide`.
    fn sweep(
        &self,
        state: Self::State,
        temperature: f64,
        controller: &AnnealingController,
        rng: &mut Rng,
    ) -> CfResult<Self::State>;

    /// Proximity to a known solution, when one is configured.
    fn proximity(&self, _state: &Self::State) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct Scored<S> {
    pub state: S,
    pub score: f64,
    pub epoch: usize,
    /// 0 is the initial draw.
    pub iteration: usize,
}

#[derive(Debug, Clone)]
pub struct ProximityBest<S> {
    pub best: Scored<S>,
    pub proximity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochSummary {
    pub epoch: usize,
    pub best_score: f64,
    pub iterations_completed: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct EpochOutcome<S> {
    pub best: Scored<S>,
    pub proximity_best: Option<ProximityBest<S>>,
    pub summary: EpochSummary,
}

#[derive(Debug, Clone)]
pub struct DriverOutcome<S> {
    pub best: Scored<S>,
    pub proximity_best: Option<ProximityBest<S>>,
    pub epochs: Vec<EpochSummary>,
    pub cancelled: bool,
}

/// Runs independent annealing chains, one per epoch, in parallel and keeps
/// the best state by score (and by proximity when available).
///
/// Each epoch owns its RNG, seeded `seed + epoch` when a seed is set, and the
/// final reduction walks epochs in index order, so a seeded run is
/// reproducible regardless of scheduling.
pub struct EpochDriver<'a, P: SearchProblem> {
    problem: &'a P,
    controller: AnnealingController,
    epochs: usize,
    threads: usize,
    seed: Option<u64>,
    cancel: CancellationToken,
}

impl<'a, P: SearchProblem> EpochDriver<'a, P> {
    pub fn new(problem: &'a P, controller: AnnealingController, epochs: usize) -> Self {
        Self {
            problem,
            controller,
            epochs,
            threads: 0,
            seed: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Bounded pool size; 0 runs on the enclosing rayon pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run<CB: ProgressCallback>(&self, callback: &CB) -> CfResult<DriverOutcome<P::State>> {
        if self.epochs == 0 {
            return Err(CipherForgeError::Config(
                "epochs must be at least 1".to_string(),
            ));
        }

        let outcomes = if self.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?;
            pool.install(|| self.run_epochs(callback))?
        } else {
            self.run_epochs(callback)?
        };

        let mut epochs = Vec::with_capacity(outcomes.len());
        let mut best: Option<Scored<P::State>> = None;
        let mut proximity_best: Option<ProximityBest<P::State>> = None;
        let mut cancelled = false;

        for outcome in outcomes {
            cancelled |= outcome.summary.cancelled;
            epochs.push(outcome.summary);

            // Strict comparisons: ties keep the lower epoch.
            if best
                .as_ref()
                .map_or(true, |b| outcome.best.score > b.score)
            {
                best = Some(outcome.best);
            }
            if let Some(candidate) = outcome.proximity_best {
                if proximity_best
                    .as_ref()
                    .map_or(true, |b| candidate.proximity > b.proximity)
                {
                    proximity_best = Some(candidate);
                }
            }
        }

        let best = best.ok_or_else(|| {
            CipherForgeError::Config("epochs must be at least 1".to_string())
        })?;

        info!(
            "Search complete: best score {:.4} (epoch {}, iteration {}){}",
            best.score,
            best.epoch,
            best.iteration,
            if cancelled { " [cancelled]" } else { "" }
        );

        Ok(DriverOutcome {
            best,
            proximity_best,
            epochs,
            cancelled: cancelled || self.cancel.is_cancelled(),
        })
    }

    fn run_epochs<CB: ProgressCallback>(
        &self,
        callback: &CB,
    ) -> CfResult<Vec<EpochOutcome<P::State>>> {
        (0..self.epochs)
            .into_par_iter()
            .map(|epoch| -> CfResult<EpochOutcome<P::State>> {
                let outcome = self.run_epoch(epoch)?;
                if !callback.on_epoch_complete(epoch, outcome.best.score) {
                    self.cancel.cancel();
                }
                Ok(outcome)
            })
            .collect()
    }

    /// One chain: a fresh initial draw followed by the annealing loop.
    pub fn run_epoch(&self, epoch: usize) -> CfResult<EpochOutcome<P::State>> {
        let mut rng = match self.seed {
            Some(s) => Rng::with_seed(s.wrapping_add(epoch as u64)),
            None => Rng::new(),
        };
        let start = Instant::now();

        let mut state = self.problem.initial_state(&mut rng)?;
        let initial_score = self.problem.score(&state);
        let mut best = Scored {
            state: state.clone(),
            score: initial_score,
            epoch,
            iteration: 0,
        };
        let mut proximity_best = self.problem.proximity(&state).map(|p| ProximityBest {
            best: best.clone(),
            proximity: p,
        });

        let iterations = self.controller.iterations();
        let mut completed = 0;
        let mut cancelled = false;

        for i in 0..iterations {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let temperature = self.controller.temperature(i);
            state = self
                .problem
                .sweep(state, temperature, &self.controller, &mut rng)?;
            completed = i + 1;

            let score = self.problem.score(&state);
            if score > best.score {
                best = Scored {
                    state: state.clone(),
                    score,
                    epoch,
                    iteration: completed,
                };
            }

            if let Some(p) = self.problem.proximity(&state) {
                if proximity_best.as_ref().map_or(true, |b| p > b.proximity) {
                    proximity_best = Some(ProximityBest {
                        best: Scored {
                            state: state.clone(),
                            score,
                            epoch,
                            iteration: completed,
                        },
                        proximity: p,
                    });
                }
            }

            debug!(
                "Epoch {} iteration {} complete [temp={:.3}, score={:.4}]",
                epoch, completed, temperature, score
            );
        }

        if cancelled {
            warn!(
                "Epoch {} cancelled after {} of {} iterations",
                epoch, completed, iterations
            );
        }
        info!(
            "Epoch {} finished in {:.2?}: best score {:.4} at iteration {}",
            epoch,
            start.elapsed(),
            best.score,
            best.iteration
        );

        let summary = EpochSummary {
            epoch,
            best_score: best.score,
            iterations_completed: completed,
            cancelled,
        };
        Ok(EpochOutcome {
            best,
            proximity_best,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walks toward a target integer; score is minus the distance.
    struct Walk {
        target: i64,
    }

    impl SearchProblem for Walk {
        type State = i64;

        fn initial_state(&self, rng: &mut Rng) -> CfResult<i64> {
            Ok(rng.i64(-50..50))
        }

        fn score(&self, state: &i64) -> f64 {
            -((state - self.target).abs() as f64)
        }

        fn sweep(
            &self,
            state: i64,
            temperature: f64,
            controller: &AnnealingController,
            rng: &mut Rng,
        ) -> CfResult<i64> {
            let proposal = state + if rng.bool() { 1 } else { -1 };
            let accept =
                controller.decide(self.score(&state), self.score(&proposal), temperature, rng)?;
            Ok(if accept { proposal } else { state })
        }

        fn proximity(&self, state: &i64) -> Option<f64> {
            Some(if *state == self.target { 100.0 } else { 0.0 })
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let problem = Walk { target: 7 };
        let controller = AnnealingController::new(0.01, 2.0, 300);
        let run = || {
            EpochDriver::new(&problem, controller, 4)
                .with_threads(2)
                .with_seed(Some(42))
                .run(&NoProgress)
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.best.state, b.best.state);
        assert_eq!(a.best.score.to_bits(), b.best.score.to_bits());
        assert_eq!(a.best.epoch, b.best.epoch);
        assert_eq!(a.epochs.len(), 4);
    }

    #[test]
    fn finds_the_target_and_tracks_proximity() {
        let problem = Walk { target: 3 };
        let controller = AnnealingController::new(0.01, 1.0, 500);
        let outcome = EpochDriver::new(&problem, controller, 2)
            .with_seed(Some(1))
            .run(&NoProgress)
            .unwrap();
        assert_eq!(outcome.best.state, 3);
        let prox = outcome.proximity_best.unwrap();
        assert_eq!(prox.proximity, 100.0);
        assert_eq!(prox.best.state, 3);
    }

    #[test]
    fn pre_cancelled_run_reports_initial_states() {
        let problem = Walk { target: 0 };
        let token = CancellationToken::new();
        token.cancel();
        let outcome = EpochDriver::new(&problem, AnnealingController::new(0.0, 1.0, 1000), 3)
            .with_cancellation(token)
            .with_seed(Some(5))
            .run(&NoProgress)
            .unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.epochs.iter().all(|e| e.iterations_completed == 0));
        assert_eq!(outcome.best.iteration, 0);
    }

    struct StopAfterFirst;

    impl ProgressCallback for StopAfterFirst {
        fn on_epoch_complete(&self, _epoch: usize, _best_score: f64) -> bool {
            false
        }
    }

    #[test]
    fn callback_can_cancel_remaining_epochs() {
        let problem = Walk { target: 0 };
        let outcome = EpochDriver::new(&problem, AnnealingController::new(0.0, 1.0, 50), 8)
            .with_threads(1)
            .with_seed(Some(5))
            .run(&StopAfterFirst)
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.epochs.len(), 8);
        assert!(outcome.epochs[1..].iter().all(|e| e.iterations_completed == 0));
    }
}
