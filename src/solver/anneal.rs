use crate::config::SolverConfig;
use crate::error::{CfResult, CipherForgeError};
use fastrand::Rng;

/// Linear temperature schedule plus the Metropolis acceptance rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingController {
    temperature_min: f64,
    temperature_max: f64,
    iterations: usize,
}

impl AnnealingController {
    pub fn new(temperature_min: f64, temperature_max: f64, iterations: usize) -> Self {
        Self {
            temperature_min,
            temperature_max,
            iterations,
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `(max - min) * (total - i) / total + min`, so iteration 0 runs at the
    /// maximum and the schedule reaches the minimum at `i == total`.
    #[inline]
    pub fn temperature(&self, iteration: usize) -> f64 {
        if self.iterations == 0 {
            return self.temperature_min;
        }
        let total = self.iterations as f64;
        let remaining = (total - iteration as f64).max(0.0);
        (self.temperature_max - self.temperature_min) * (remaining / total) + self.temperature_min
    }

    /// Accepts a proposal that scores at least as well as the current state,
    /// otherwise with probability `exp(-(current - proposal) / temperature)`.
    ///
    /// A negative or NaN probability means the scores broke the ordering
    /// the rule depends on and is returned as `InvariantViolation`.
    #[inline]
    pub fn decide(
        &self,
        current: f64,
        proposal: f64,
        temperature: f64,
        rng: &mut Rng,
    ) -> CfResult<bool> {
        if proposal >= current {
            return Ok(true);
        }

        let probability = (-(current - proposal) / temperature).exp();
        if probability.is_nan() || probability < 0.0 {
            return Err(CipherForgeError::InvariantViolation {
                current,
                proposal,
                temperature,
                probability,
            });
        }

        if probability > 1.0 {
            return Ok(true);
        }
        Ok(rng.f64() < probability)
    }
}

impl From<&SolverConfig> for AnnealingController {
    fn from(cfg: &SolverConfig) -> Self {
        Self::new(
            cfg.temperature_min,
            cfg.temperature_max,
            cfg.sampler_iterations,
        )
    }
}
