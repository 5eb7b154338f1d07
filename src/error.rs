use thiserror::Error;

#[derive(Error, Debug)]
pub enum CipherForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Error: {0}")]
    Data(String),

    /// The acceptance rule produced a probability that is negative or not a
    /// number. The score function broke the ordering contract, so the run
    /// aborts instead of clamping.
    #[error(
        "Invariant Violation: acceptance probability {probability} (current={current}, proposal={proposal}, temperature={temperature})"
    )]
    InvariantViolation {
        current: f64,
        proposal: f64,
        temperature: f64,
        probability: f64,
    },

    #[error("Thread Pool Error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type CfResult<T> = Result<T, CipherForgeError>;
