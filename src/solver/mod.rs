pub mod anneal;
pub mod engine;
pub mod oracle;
pub mod roulette;
pub mod solution;
pub mod substitution;
pub mod transposition;

pub use anneal::AnnealingController;
pub use engine::{
    CancellationToken, DriverOutcome, EpochDriver, EpochSummary, NoProgress, ProgressCallback,
    Scored, SearchProblem,
};
pub use oracle::{KnownPlaintext, KnownPlaintextOracle};
pub use solution::{CandidateSolution, SymbolProposal};
pub use substitution::SubstitutionProblem;
pub use transposition::{bigram_repeats, TranspositionKey, TranspositionProblem};
