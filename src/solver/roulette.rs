use crate::error::{CfResult, CipherForgeError};
use fastrand::Rng;

/// Frequency-weighted letter draw over a cumulative distribution.
#[derive(Debug, Clone)]
pub struct RouletteSampler {
    letters: Vec<char>,
    cumulative: Vec<f64>,
    total: f64,
}

impl RouletteSampler {
    /// `flattening` blends each weight toward uniform:
    /// `p' = p * (1 - f) + f / n`.
    pub fn new(distribution: &[(char, f64)], flattening: f64) -> CfResult<Self> {
        if distribution.is_empty() {
            return Err(CipherForgeError::Data(
                "cannot sample from an empty letter distribution".to_string(),
            ));
        }
        let n = distribution.len() as f64;
        let mut letters = Vec::with_capacity(distribution.len());
        let mut cumulative = Vec::with_capacity(distribution.len());
        let mut total = 0.0;

        for &(letter, p) in distribution {
            let weight = p.max(0.0) * (1.0 - flattening) + flattening / n;
            total += weight;
            letters.push(letter);
            cumulative.push(total);
        }

        if total.is_nan() || total <= 0.0 {
            return Err(CipherForgeError::Data(
                "letter distribution has no probability mass".to_string(),
            ));
        }

        Ok(Self {
            letters,
            cumulative,
            total,
        })
    }

    pub fn sample(&self, rng: &mut Rng) -> char {
        let target = rng.f64() * self.total;
        let idx = self.cumulative.partition_point(|&c| c <= target);
        self.letters[idx.min(self.letters.len() - 1)]
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }
}
