use cipherforge::cipher::transposition;
use cipherforge::error::{CfResult, CipherForgeError};
use cipherforge::model::corpus::normalize;
use cipherforge::model::loader::DEFAULT_ALPHABET;
use clap::Args;
use std::fs;

#[derive(Args, Debug, Clone)]
pub struct EncipherArgs {
    /// Plaintext file, normalized to the alphabet before enciphering
    #[arg(long)]
    pub text: String,

    /// Column permutation, e.g. "2,0,1"
    #[arg(long)]
    pub key: String,

    #[arg(long, default_value = DEFAULT_ALPHABET)]
    pub alphabet: String,
}

pub fn run(args: EncipherArgs) -> CfResult<()> {
    let key = parse_key(&args.key)?;
    transposition::validate_key(&key)?;

    let plain = normalize(&fs::read_to_string(&args.text)?, &args.alphabet);
    let enciphered = transposition::encipher(&plain, &key);

    for row in enciphered.chunks(key.len()) {
        println!("{}", row.iter().collect::<String>());
    }
    Ok(())
}

fn parse_key(raw: &str) -> CfResult<Vec<usize>> {
    raw.split(',')
        .map(|p| {
            p.trim().parse::<usize>().map_err(|_| {
                CipherForgeError::Config(format!("key entry '{}' is not a column index", p.trim()))
            })
        })
        .collect()
}
