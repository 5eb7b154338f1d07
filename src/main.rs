use clap::{Parser, Subcommand};
use std::process;
use tracing::Level;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON instead of tables
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover a monoalphabetic substitution key
    Solve(cmd::solve::SolveArgs),
    /// Recover a columnar transposition key
    Transposition(cmd::transposition::TranspositionArgs),
    /// Count n-grams in a corpus
    Count(cmd::count::CountArgs),
    /// Apply a columnar transposition key to plaintext
    Encipher(cmd::encipher::EncipherArgs),
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable.
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let result = match cli.command {
        Commands::Solve(args) => cmd::solve::run(args, cli.json),
        Commands::Transposition(args) => cmd::transposition::run(args, cli.json),
        Commands::Count(args) => cmd::count::run(args),
        Commands::Encipher(args) => cmd::encipher::run(args),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}
