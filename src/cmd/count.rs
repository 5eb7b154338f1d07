use cipherforge::error::{CfResult, CipherForgeError};
use cipherforge::model::corpus;
use cipherforge::model::loader::DEFAULT_ALPHABET;
use clap::Args;
use std::fs;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct CountArgs {
    /// Plain text to count
    #[arg(long)]
    pub corpus: String,

    /// Longest n-gram to count; every shorter order is counted too
    #[arg(long, default_value_t = 5)]
    pub order: usize,

    #[arg(long, default_value = DEFAULT_ALPHABET)]
    pub alphabet: String,

    /// Write the counts here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn run(args: CountArgs) -> CfResult<()> {
    if args.order == 0 {
        return Err(CipherForgeError::Config(
            "order must be at least 1".to_string(),
        ));
    }

    let text = fs::read_to_string(&args.corpus)?;
    let counts = corpus::count_ngrams(&text, args.order, &args.alphabet);
    if counts.is_empty() {
        return Err(CipherForgeError::Data(format!(
            "'{}' contains no characters from the alphabet",
            args.corpus
        )));
    }
    info!("Counted {} distinct n-grams up to order {}", counts.len(), args.order);

    let tsv = corpus::to_tsv(&counts);
    match &args.output {
        Some(path) => fs::write(path, tsv)?,
        None => print!("{}", tsv),
    }
    Ok(())
}
