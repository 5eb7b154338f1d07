use crate::cmd::{deadline_token, EpochReporter};
use crate::reports;
use cipherforge::api::solve_transposition_key_with;
use cipherforge::cipher::Cipher;
use cipherforge::config::TranspositionConfig;
use cipherforge::error::CfResult;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct TranspositionArgs {
    #[command(flatten)]
    pub config: TranspositionConfig,

    /// JSON configuration; replaces the flag values when given
    #[arg(long)]
    pub config_file: Option<String>,

    #[arg(long)]
    pub cipher: String,

    #[arg(long, default_value_t = false)]
    pub chars: bool,

    #[arg(long)]
    pub columns: Option<usize>,

    /// Ignore the final (possibly short) row of the cipher grid
    #[arg(long, default_value_t = false)]
    pub drop_last_row: bool,

    #[arg(long)]
    pub time: Option<u64>,
}

pub fn run(args: TranspositionArgs, json: bool) -> CfResult<()> {
    let config = match &args.config_file {
        Some(path) => TranspositionConfig::load_from_file(path)?,
        None => args.config.clone(),
    };

    let mut cipher = Cipher::load_from_file(&args.cipher, args.chars, args.columns)?;
    if args.drop_last_row {
        cipher = cipher.without_last_row();
    }

    if !json {
        println!(
            "\n🔀 Searching key lengths {}..={} for '{}' ({} symbols)",
            config.key_length_min,
            config.key_length_max,
            cipher.name,
            cipher.len()
        );
    }

    let result = solve_transposition_key_with(
        &cipher,
        &config,
        &deadline_token(args.time),
        &EpochReporter::new(json),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        reports::print_transposition(&result, &result.apply(&cipher));
    }
    Ok(())
}
