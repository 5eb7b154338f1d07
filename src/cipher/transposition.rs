//! Columnar transposition over any token sequence.
//!
//! A key of length K is a permutation of `0..K`. Enciphering writes the text
//! row-wise K columns wide and reads the columns out in key order: first the
//! column holding 0, then the column holding 1, and so on. Positions past the
//! last full row pass through untouched.

use crate::error::{CfResult, CipherForgeError};

pub fn validate_key(key: &[usize]) -> CfResult<()> {
    if key.len() < 2 {
        return Err(CipherForgeError::Config(format!(
            "transposition key must have at least 2 columns, got {}",
            key.len()
        )));
    }
    let mut seen = vec![false; key.len()];
    for &k in key {
        if k >= key.len() || seen[k] {
            return Err(CipherForgeError::Config(format!(
                "transposition key {:?} is not a permutation of 0..{}",
                key,
                key.len()
            )));
        }
        seen[k] = true;
    }
    Ok(())
}

/// `inverse[i]` is the column whose key value is `i`.
pub fn inverse(key: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; key.len()];
    for (col, &k) in key.iter().enumerate() {
        inv[k] = col;
    }
    inv
}

pub fn encipher<T: Clone>(text: &[T], key: &[usize]) -> Vec<T> {
    let width = key.len();
    let mut out = text.to_vec();
    if width == 0 {
        return out;
    }
    let rows = text.len() / width;
    let mut k = 0;
    for col in inverse(key) {
        for row in 0..rows {
            out[k] = text[row * width + col].clone();
            k += 1;
        }
    }
    out
}

pub fn unwrap<T: Clone>(text: &[T], key: &[usize]) -> Vec<T> {
    let mut out = text.to_vec();
    unwrap_into(text, key, &mut out);
    out
}

/// `unwrap` into a caller-owned buffer of the same length as `text`.
pub fn unwrap_into<T: Clone>(text: &[T], key: &[usize], out: &mut [T]) {
    let width = key.len();
    if width == 0 {
        return;
    }
    let rows = text.len() / width;
    let mut k = 0;
    for col in inverse(key) {
        for row in 0..rows {
            out[row * width + col] = text[k].clone();
            k += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn encipher_reads_columns_in_key_order() {
        let text: Vec<char> = "abcdef".chars().collect();
        // columns: [a d] [b e] [c f]; key 2,0,1 reads column 1, 2 then 0
        let out: String = encipher(&text, &[2, 0, 1]).into_iter().collect();
        assert_eq!(out, "becfad");
    }

    #[rstest]
    #[case("thequickbrownfox", vec![1, 0])]
    #[case("thequickbrownfox", vec![3, 1, 0, 2])]
    #[case("attackatdawnxyz", vec![4, 2, 0, 3, 1])]
    #[case("ragged", vec![2, 3, 0, 1])]
    fn unwrap_inverts_encipher(#[case] text: &str, #[case] key: Vec<usize>) {
        let chars: Vec<char> = text.chars().collect();
        let back = unwrap(&encipher(&chars, &key), &key);
        assert_eq!(back, chars);
    }

    #[test]
    fn tail_past_full_rows_is_untouched() {
        let text: Vec<char> = "abcdefg".chars().collect();
        let out = encipher(&text, &[1, 0, 2]);
        assert_eq!(out[6], 'g');
    }

    #[rstest]
    #[case(vec![0])]
    #[case(vec![0, 0])]
    #[case(vec![0, 2])]
    fn invalid_keys_are_rejected(#[case] key: Vec<usize>) {
        assert!(validate_key(&key).is_err());
    }
}
