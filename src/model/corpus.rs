use crate::model::NGramCounts;
use itertools::Itertools;
use std::collections::HashSet;

/// Lowercases `content` and keeps only characters in `alphabet`, so word
/// boundaries and punctuation vanish.
pub fn normalize(content: &str, alphabet: &str) -> Vec<char> {
    let valid: HashSet<char> = alphabet.chars().collect();
    content
        .chars()
        .flat_map(|c| c.to_lowercase())
        .filter(|c| valid.contains(c))
        .collect()
}

/// Counts every window of length 1..=order over the normalized text.
pub fn count_ngrams(content: &str, order: usize, alphabet: &str) -> NGramCounts {
    let text = normalize(content, alphabet);
    let mut counts = NGramCounts::new();

    for n in 1..=order {
        if text.len() < n {
            break;
        }
        for window in text.windows(n) {
            let key: String = window.iter().collect();
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    counts
}

/// Renders counts as `ngram<TAB>count` lines, shortest n-grams first and
/// most frequent first within an order.
pub fn to_tsv(counts: &NGramCounts) -> String {
    let mut output = String::new();
    let sorted = counts
        .iter()
        .sorted_by(|a, b| {
            a.0.chars()
                .count()
                .cmp(&b.0.chars().count())
                .then(b.1.cmp(a.1))
                .then(a.0.cmp(b.0))
        });
    for (k, v) in sorted {
        output.push_str(&format!("{}\t{}\n", k, v));
    }
    output
}
