use crate::error::{CfResult, CipherForgeError};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fmt::Display as FmtDisplay;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Order in which symbols are visited during one sampler iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IterationOrder {
    Fixed,
    Randomized,
}

/// Comma-separated names of every variant, as accepted on the command line
/// and in config files.
pub fn variant_names<E: IntoEnumIterator + FmtDisplay>() -> String {
    E::iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    #[arg(long, default_value_t = 5000)]
    pub sampler_iterations: usize,
    #[arg(long, default_value_t = 0.01)]
    pub temperature_min: f64,
    #[arg(long, default_value_t = 10.0)]
    pub temperature_max: f64,
    #[arg(
        long,
        default_value_t = IterationOrder::Randomized,
        help = format!("Symbol visit order: {}", variant_names::<IterationOrder>())
    )]
    pub iteration_order: IterationOrder,
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,
    #[arg(long, default_value_t = 5)]
    pub model_order: usize,
    #[arg(long, default_value_t = false)]
    pub use_known_oracle: bool,

    // 0 = one worker per available core
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
    #[arg(long)]
    pub seed: Option<u64>,

    // Blend of the unigram distribution with a flat one when drawing the
    // initial key. 0.0 keeps the model's letter frequencies untouched.
    #[arg(long, default_value_t = 0.0)]
    pub letter_flattening: f64,

    // "SYMBOL:letter,SYMBOL:letter"
    #[arg(long, default_value = "")]
    pub pinned_symbols: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            sampler_iterations: 5000,
            temperature_min: 0.01,
            temperature_max: 10.0,
            iteration_order: IterationOrder::Randomized,
            epochs: 1,
            model_order: 5,
            use_known_oracle: false,
            threads: 0,
            seed: None,
            letter_flattening: 0.0,
            pinned_symbols: String::new(),
        }
    }
}

impl SolverConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        load_json(path)
    }

    pub fn validate(&self) -> CfResult<()> {
        if self.sampler_iterations == 0 {
            return Err(config_err("sampler iterations must be greater than zero"));
        }
        if self.epochs == 0 {
            return Err(config_err("epochs must be at least 1"));
        }
        if self.model_order == 0 {
            return Err(config_err("model order must be at least 1"));
        }
        if !self.temperature_min.is_finite() || !self.temperature_max.is_finite() {
            return Err(config_err("annealing temperatures must be finite"));
        }
        if self.temperature_min < 0.0 {
            return Err(config_err("annealing temperatures must not be negative"));
        }
        if self.temperature_min > self.temperature_max {
            return Err(CipherForgeError::Config(format!(
                "minimum temperature {} is greater than maximum temperature {}",
                self.temperature_min, self.temperature_max
            )));
        }
        if !(0.0..=1.0).contains(&self.letter_flattening) {
            return Err(config_err("letter flattening must be within [0, 1]"));
        }
        self.parse_pins()?;
        Ok(())
    }

    /// Worker count for the bounded pools, resolving 0 to the core count.
    pub fn resolved_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    pub fn parse_pins(&self) -> CfResult<Vec<(String, char)>> {
        let mut pins = Vec::new();
        if self.pinned_symbols.trim().is_empty() {
            return Ok(pins);
        }

        for part in self.pinned_symbols.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (symbol, letter) = part.rsplit_once(':').ok_or_else(|| {
                CipherForgeError::Config(format!("pin '{}' is not in SYMBOL:letter form", part))
            })?;
            let mut chars = letter.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !symbol.trim().is_empty() => {
                    pins.push((symbol.trim().to_string(), c.to_ascii_lowercase()));
                }
                _ => {
                    return Err(CipherForgeError::Config(format!(
                        "pin '{}' must map a symbol to exactly one letter",
                        part
                    )))
                }
            }
        }
        Ok(pins)
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranspositionConfig {
    #[command(flatten)]
    #[serde(flatten)]
    pub solver: SolverConfig,
    #[arg(long, default_value_t = 2)]
    pub key_length_min: usize,
    #[arg(long, default_value_t = 10)]
    pub key_length_max: usize,
}

impl Default for TranspositionConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            key_length_min: 2,
            key_length_max: 10,
        }
    }
}

impl TranspositionConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        load_json(path)
    }

    pub fn validate(&self, cipher_length: usize) -> CfResult<()> {
        self.solver.validate()?;
        if self.key_length_min < 2 {
            return Err(CipherForgeError::Config(format!(
                "minimum key length {} must be at least 2",
                self.key_length_min
            )));
        }
        if self.key_length_min > self.key_length_max {
            return Err(CipherForgeError::Config(format!(
                "minimum key length {} is greater than maximum key length {}",
                self.key_length_min, self.key_length_max
            )));
        }
        if self.key_length_max >= cipher_length {
            return Err(CipherForgeError::Config(format!(
                "maximum key length {} must be less than the cipher length {}",
                self.key_length_max, cipher_length
            )));
        }
        Ok(())
    }
}

fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> CfResult<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn config_err(msg: &str) -> CipherForgeError {
    CipherForgeError::Config(msg.to_string())
}
