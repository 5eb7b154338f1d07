mod common;

use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    corpus_path: PathBuf,
    cipher_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let corpus = vec![common::PASSAGE; 20].join("\n");
        let corpus_path = common::write_file(dir.path(), "corpus.txt", &corpus);

        let enciphered = common::shift_encipher(&common::plaintext(), 7);
        let tokens: Vec<String> = enciphered.chars().map(|c| c.to_string()).collect();
        let rows: Vec<String> = tokens.chunks(20).map(|r| r.join(" ")).collect();
        let cipher_path = common::write_file(dir.path(), "dickens.txt", &rows.join("\n"));

        Self {
            dir,
            corpus_path,
            cipher_path,
        }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cipherforge"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

#[test]
fn count_writes_sorted_tsv() {
    let ctx = TestContext::new();
    let out = ctx.path("counts.tsv");
    let output = run(&[
        "count",
        "--corpus",
        ctx.corpus_path.to_str().unwrap(),
        "--order",
        "2",
        "--output",
        out.as_str(),
    ]);
    assert!(output.status.success());

    let tsv = std::fs::read_to_string(&out).unwrap();
    let line = Regex::new(r"^[a-z]{1,2}\t\d+$").unwrap();
    assert!(tsv.lines().all(|l| line.is_match(l)));
    // Unigrams come first
    assert!(Regex::new(r"^[a-z]\t").unwrap().is_match(&tsv));
}

#[test]
fn solve_reports_json() {
    let ctx = TestContext::new();
    let output = run(&[
        "solve",
        "--json",
        "--corpus",
        ctx.corpus_path.to_str().unwrap(),
        "--cipher",
        ctx.cipher_path.to_str().unwrap(),
        "--model-order",
        "3",
        "--sampler-iterations",
        "50",
        "--epochs",
        "2",
        "--seed",
        "1",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(json["cipherName"], "dickens");
    let plaintext = json["best"]["plaintext"].as_str().unwrap();
    assert!(Regex::new(r"^[a-z]+$").unwrap().is_match(plaintext));
    assert_eq!(plaintext.len(), common::plaintext().len());
    assert_eq!(json["epochs"].as_array().unwrap().len(), 2);
}

#[test]
fn solve_can_drop_the_last_row() {
    let ctx = TestContext::new();
    let output = run(&[
        "solve",
        "--json",
        "--drop-last-row",
        "--corpus",
        ctx.corpus_path.to_str().unwrap(),
        "--cipher",
        ctx.cipher_path.to_str().unwrap(),
        "--model-order",
        "3",
        "--sampler-iterations",
        "20",
        "--seed",
        "2",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let full_rows = (common::plaintext().len() - 1) / 20;
    let plaintext = json["best"]["plaintext"].as_str().unwrap();
    assert_eq!(plaintext.len(), full_rows * 20);
}

#[test]
fn solve_help_lists_enum_choices() {
    let output = run(&["solve", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fixed, randomized"));
    assert!(stdout.contains("forward, backward"));
    assert!(stdout.contains("--drop-last-row"));
}

#[test]
fn solve_prints_tables() {
    let ctx = TestContext::new();
    let known = common::write_file(ctx.dir.path(), "known.txt", common::PASSAGE);
    let output = run(&[
        "solve",
        "--corpus",
        ctx.corpus_path.to_str().unwrap(),
        "--cipher",
        ctx.cipher_path.to_str().unwrap(),
        "--known",
        known.to_str().unwrap(),
        "--model-order",
        "3",
        "--sampler-iterations",
        "20",
        "--seed",
        "4",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Decoded:"));
    assert!(Regex::new(r"\| Symbol\s+\| Letter").unwrap().is_match(&stdout));
    assert!(Regex::new(r"Closest to known plaintext: \d+\.\d%").unwrap().is_match(&stdout));
}

#[test]
fn solve_without_counts_or_corpus_fails() {
    let ctx = TestContext::new();
    let output = run(&["solve", "--cipher", ctx.cipher_path.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn bad_configuration_exits_non_zero() {
    let ctx = TestContext::new();
    let output = run(&[
        "solve",
        "--corpus",
        ctx.corpus_path.to_str().unwrap(),
        "--cipher",
        ctx.cipher_path.to_str().unwrap(),
        "--model-order",
        "3",
        "--temperature-min",
        "5",
        "--temperature-max",
        "1",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration Error"));
}

#[test]
fn encipher_then_transposition_recovers_the_key() {
    let ctx = TestContext::new();
    let plain = common::write_file(ctx.dir.path(), "plain.txt", common::PASSAGE);

    let enciphered = run(&[
        "encipher",
        "--text",
        plain.to_str().unwrap(),
        "--key",
        "2,0,3,1",
    ]);
    assert!(enciphered.status.success());
    let grid = String::from_utf8_lossy(&enciphered.stdout).to_string();
    let cipher = common::write_file(ctx.dir.path(), "columns.txt", &grid);

    let output = run(&[
        "transposition",
        "--json",
        "--chars",
        "--cipher",
        cipher.to_str().unwrap(),
        "--key-length-min",
        "3",
        "--key-length-max",
        "5",
        "--sampler-iterations",
        "60",
        "--epochs",
        "2",
        "--seed",
        "5",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["keyLength"], 4);
    assert_eq!(json["keyPermutation"], serde_json::json!([2, 0, 3, 1]));
    assert_eq!(json["candidates"].as_array().unwrap().len(), 3);
}

#[test]
fn transposition_progress_names_the_key_length() {
    let ctx = TestContext::new();
    let plain = common::write_file(ctx.dir.path(), "plain.txt", common::PASSAGE);
    let enciphered = run(&[
        "encipher",
        "--text",
        plain.to_str().unwrap(),
        "--key",
        "1,0,2",
    ]);
    assert!(enciphered.status.success());
    let cipher = common::write_file(
        ctx.dir.path(),
        "columns.txt",
        &String::from_utf8_lossy(&enciphered.stdout),
    );

    let output = run(&[
        "transposition",
        "--chars",
        "--cipher",
        cipher.to_str().unwrap(),
        "--key-length-min",
        "2",
        "--key-length-max",
        "3",
        "--sampler-iterations",
        "10",
        "--epochs",
        "2",
        "--seed",
        "3",
    ]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = Regex::new(r"key length\s+(\d+) epoch\s+(\d+) done").unwrap();
    let mut seen: Vec<(u32, u32)> = line
        .captures_iter(&stderr)
        .map(|c| (c[1].parse().unwrap(), c[2].parse().unwrap()))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![(2, 0), (2, 1), (3, 0), (3, 1)]);
}
