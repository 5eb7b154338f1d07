pub mod api;
pub mod cipher;
pub mod config;
pub mod error;
pub mod model;
pub mod solver;
// cmd and reports belong to the binary (main.rs).

pub use api::{solve, solve_transposition_key, SolutionResult, Solver, TranspositionResult};
pub use error::{CfResult, CipherForgeError};
