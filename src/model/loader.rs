use crate::error::CfResult;
use crate::model::NGramCounts;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Reads `ngram<TAB>count` rows (comma separated when the file ends in
/// `.csv`). Keys are lowercased, rows with characters outside `alphabet` or
/// longer than `order` are dropped, and duplicate keys are summed.
pub fn load_counts<P: AsRef<Path>>(path: P, alphabet: &str, order: usize) -> CfResult<NGramCounts> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => b',',
        _ => b'\t',
    };
    info!("Loading n-gram counts from {}", path.display());
    let file = File::open(path)?;
    read_counts(file, delimiter, alphabet, order)
}

pub fn read_counts<R: Read>(
    reader: R,
    delimiter: u8,
    alphabet: &str,
    order: usize,
) -> CfResult<NGramCounts> {
    let valid: HashSet<char> = alphabet.chars().collect();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut counts = NGramCounts::new();
    let mut malformed = 0usize;
    let mut filtered = 0usize;

    for result in rdr.records() {
        let rec = result?;
        if rec.len() < 2 {
            malformed += 1;
            continue;
        }

        let key = rec[0].trim().to_lowercase();
        if key.is_empty() {
            malformed += 1;
            continue;
        }

        let count: u64 = match rec[1].trim().parse() {
            Ok(v) => v,
            Err(_) => {
                malformed += 1;
                continue;
            }
        };

        if key.chars().count() > order || !key.chars().all(|c| valid.contains(&c)) {
            filtered += 1;
            continue;
        }

        *counts.entry(key).or_insert(0) += count;
    }

    if malformed > 0 {
        warn!("Skipped {} malformed n-gram rows", malformed);
    }
    debug!(
        "Loaded {} distinct n-grams ({} filtered by alphabet or order)",
        counts.len(),
        filtered
    );

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_and_foreign_rows_are_skipped() {
        let data = "-gram\t*/*\nTH\t200\nth\t5\nthe\t300\nthem\t10\né\t4\nx\tlots\n";
        let counts = read_counts(data.as_bytes(), b'\t', DEFAULT_ALPHABET, 3).unwrap();
        assert_eq!(counts.get("th"), Some(&205));
        assert_eq!(counts.get("the"), Some(&300));
        assert!(!counts.contains_key("them"));
        assert!(!counts.contains_key("é"));
        assert_eq!(counts.len(), 2);
    }
}
