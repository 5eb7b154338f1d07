use crate::cmd::{deadline_token, EpochReporter};
use crate::reports;
use cipherforge::cipher::Cipher;
use cipherforge::config::{variant_names, SolverConfig};
use cipherforge::error::{CfResult, CipherForgeError};
use cipherforge::model::loader::{load_counts, DEFAULT_ALPHABET};
use cipherforge::model::{corpus, Direction, ModelBuildParams};
use cipherforge::solver::{KnownPlaintext, KnownPlaintextOracle};
use cipherforge::Solver;
use clap::Args;
use std::fs;

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub config: SolverConfig,

    /// JSON solver configuration; replaces the flag values when given
    #[arg(long)]
    pub config_file: Option<String>,

    /// Pre-counted n-grams, `ngram<TAB>count` per line
    #[arg(long, required_unless_present = "corpus")]
    pub counts: Option<String>,

    /// Raw text to count n-grams from instead of --counts
    #[arg(long, conflicts_with = "counts")]
    pub corpus: Option<String>,

    #[arg(long)]
    pub cipher: String,

    /// One symbol per character instead of whitespace-separated tokens
    #[arg(long, default_value_t = false)]
    pub chars: bool,

    #[arg(long)]
    pub columns: Option<usize>,

    /// Known plaintext, enables proximity tracking
    #[arg(long)]
    pub known: Option<String>,

    #[arg(long, default_value = DEFAULT_ALPHABET)]
    pub alphabet: String,

    #[arg(
        long,
        default_value_t = Direction::Forward,
        help = format!("Reading direction of the model: {}", variant_names::<Direction>())
    )]
    pub direction: Direction,

    /// Ignore the final row of the cipher grid
    #[arg(long, default_value_t = false)]
    pub drop_last_row: bool,

    /// Stop every chain after this many seconds
    #[arg(long)]
    pub time: Option<u64>,
}

pub fn run(args: SolveArgs, json: bool) -> CfResult<()> {
    let mut config = match &args.config_file {
        Some(path) => SolverConfig::load_from_file(path)?,
        None => args.config.clone(),
    };

    let counts = match (&args.counts, &args.corpus) {
        (Some(path), _) => load_counts(path, &args.alphabet, config.model_order)?,
        (None, Some(path)) => {
            let text = fs::read_to_string(path)?;
            corpus::count_ngrams(&text, config.model_order, &args.alphabet)
        }
        (None, None) => {
            return Err(CipherForgeError::Config(
                "either --counts or --corpus is required".to_string(),
            ))
        }
    };

    if !json {
        println!("\n🚀 Building {}-gram model...", config.model_order);
    }
    let model = ModelBuildParams::builder()
        .counts(counts)
        .order(config.model_order)
        .direction(args.direction)
        .threads(config.threads)
        .build()
        .build_model()?;

    let mut cipher = Cipher::load_from_file(&args.cipher, args.chars, args.columns)?;
    if args.drop_last_row {
        cipher = cipher.without_last_row();
    }

    let known = match &args.known {
        Some(path) => {
            config.use_known_oracle = true;
            Some(KnownPlaintext::from_text(&fs::read_to_string(path)?, &args.alphabet))
        }
        None => None,
    };

    if !json {
        println!(
            "🔐 Solving '{}' ({} symbols, {} rows x {} columns)",
            cipher.name,
            cipher.len(),
            cipher.rows,
            cipher.columns
        );
    }

    let mut solver = Solver::new(&model, config).with_cancellation(deadline_token(args.time));
    if let Some(k) = &known {
        solver = solver.with_oracle(k as &dyn KnownPlaintextOracle);
    }
    let result = solver.solve_with_progress(&cipher, &EpochReporter::new(json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        reports::print_solution(&result, &cipher);
    }
    Ok(())
}
