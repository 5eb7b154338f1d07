#![allow(dead_code)]

use cipherforge::cipher::Cipher;
use cipherforge::config::{IterationOrder, SolverConfig};
use cipherforge::model::loader::DEFAULT_ALPHABET;
use cipherforge::model::{corpus, ModelBuildParams, NGramModel};
use std::fs;
use std::path::{Path, PathBuf};

pub const PASSAGE: &str = "It was the best of times, it was the worst of times, it was the age of \
    wisdom, it was the age of foolishness, it was the epoch of belief, it was the epoch of \
    incredulity, it was the season of Light, it was the season of Darkness, it was the spring \
    of hope, it was the winter of despair, we had everything before us, we had nothing before us.";

/// The passage lowercased with everything outside a-z removed.
pub fn plaintext() -> String {
    corpus::normalize(PASSAGE, DEFAULT_ALPHABET)
        .into_iter()
        .collect()
}

/// Model counted over the passage repeated many times, so the unknown floor
/// sits well below every observed window.
pub fn passage_model(order: usize) -> NGramModel {
    let text = vec![PASSAGE; 20].join(" ");
    ModelBuildParams::builder()
        .counts(corpus::count_ngrams(&text, order, DEFAULT_ALPHABET))
        .order(order)
        .threads(2)
        .build()
        .build_model()
        .expect("passage model builds")
}

/// Maps each lowercase letter to the uppercase letter `shift` places on.
pub fn shift_encipher(plain: &str, shift: u8) -> String {
    plain
        .bytes()
        .map(|b| (((b - b'a' + shift) % 26) + b'A') as char)
        .collect()
}

pub fn substitution_cipher() -> Cipher {
    Cipher::from_chars("dickens", &shift_encipher(&plaintext(), 7))
}

pub fn quick_config(order: usize) -> SolverConfig {
    SolverConfig {
        sampler_iterations: 200,
        temperature_min: 0.1,
        temperature_max: 5.0,
        iteration_order: IterationOrder::Randomized,
        epochs: 2,
        model_order: order,
        threads: 2,
        seed: Some(7),
        ..Default::default()
    }
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write test fixture");
    path
}

/// Percentage of positions where `a` and `b` agree.
pub fn agreement(a: &str, b: &str) -> f64 {
    let len = a.chars().count().max(b.chars().count()).max(1);
    let same = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    same as f64 * 100.0 / len as f64
}
