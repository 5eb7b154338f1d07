pub mod transposition;

use crate::error::{CfResult, CipherForgeError};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Suffix marking a token as locked in whitespace-separated cipher files.
pub const LOCK_MARKER: char = '!';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub value: String,
    #[serde(default)]
    pub locked: bool,
}

impl Ciphertext {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            locked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cipher {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub ciphertext: Vec<Ciphertext>,
}

impl Cipher {
    /// Builds a cipher laid out `columns` wide; the last row may be short.
    pub fn new(name: impl Into<String>, columns: usize, ciphertext: Vec<Ciphertext>) -> Self {
        let columns = columns.max(1);
        let rows = ciphertext.len().div_ceil(columns);
        Self {
            name: name.into(),
            rows,
            columns,
            ciphertext,
        }
    }

    /// One symbol per non-whitespace character, laid out as a single row.
    pub fn from_chars(name: impl Into<String>, text: &str) -> Self {
        let tokens: Vec<Ciphertext> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Ciphertext::new(c.to_string()))
            .collect();
        let columns = tokens.len();
        Self::new(name, columns, tokens)
    }

    /// Whitespace-separated tokens. A token ending in `!` is locked. When
    /// `columns` is `None`, each input line is one row.
    pub fn parse(name: impl Into<String>, text: &str, columns: Option<usize>) -> CfResult<Self> {
        let mut tokens = Vec::new();
        let mut widest = 0usize;

        for line in text.lines() {
            let mut width = 0;
            for raw in line.split_whitespace() {
                let (value, locked) = match raw.strip_suffix(LOCK_MARKER) {
                    Some(v) if !v.is_empty() => (v, true),
                    _ => (raw, false),
                };
                tokens.push(Ciphertext {
                    value: value.to_string(),
                    locked,
                });
                width += 1;
            }
            widest = widest.max(width);
        }

        if tokens.is_empty() {
            return Err(CipherForgeError::Data("cipher has no symbols".to_string()));
        }
        Ok(Self::new(name, columns.unwrap_or(widest), tokens))
    }

    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        per_char: bool,
        columns: Option<usize>,
    ) -> CfResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("cipher")
            .to_string();
        let content = fs::read_to_string(path)?;
        if per_char {
            let mut cipher = Self::from_chars(name, &content);
            if let Some(c) = columns {
                cipher = cipher.reshaped(c);
            }
            if cipher.is_empty() {
                return Err(CipherForgeError::Data("cipher has no symbols".to_string()));
            }
            Ok(cipher)
        } else {
            Self::parse(name, &content, columns)
        }
    }

    pub fn len(&self) -> usize {
        self.ciphertext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    pub fn values(&self) -> Vec<&str> {
        self.ciphertext.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn reshaped(&self, columns: usize) -> Self {
        Self::new(self.name.clone(), columns, self.ciphertext.clone())
    }

    /// Same shape with the ciphertext replaced.
    pub fn with_ciphertext(&self, ciphertext: Vec<Ciphertext>) -> Self {
        Self::new(self.name.clone(), self.columns, ciphertext)
    }

    /// Drops the final row of the declared shape. A single-row cipher is
    /// returned unchanged.
    pub fn without_last_row(&self) -> Self {
        if self.rows <= 1 {
            return self.clone();
        }
        let keep = self.columns * (self.rows - 1);
        self.with_ciphertext(self.ciphertext[..keep].to_vec())
    }
}

/// Dense view of a cipher: a small integer id per distinct symbol (in order
/// of first appearance) and the positions each symbol occupies.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<String>,
    ids: Vec<u32>,
    positions: Vec<Vec<usize>>,
    locked: Vec<bool>,
}

impl SymbolTable {
    pub fn from_cipher(cipher: &Cipher) -> Self {
        let mut index: FnvHashMap<&str, u32> = FnvHashMap::default();
        let mut symbols = Vec::new();
        let mut positions: Vec<Vec<usize>> = Vec::new();
        let mut locked = Vec::new();
        let mut ids = Vec::with_capacity(cipher.len());

        for (pos, token) in cipher.ciphertext.iter().enumerate() {
            let id = *index.entry(token.value.as_str()).or_insert_with(|| {
                symbols.push(token.value.clone());
                positions.push(Vec::new());
                locked.push(false);
                (symbols.len() - 1) as u32
            });
            positions[id as usize].push(pos);
            locked[id as usize] |= token.locked;
            ids.push(id);
        }

        Self {
            symbols,
            ids,
            positions,
            locked,
        }
    }

    /// Number of distinct symbols, i.e. the key size.
    pub fn key_size(&self) -> usize {
        self.symbols.len()
    }

    /// Cipher length.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn symbol(&self, id: u32) -> &str {
        &self.symbols[id as usize]
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn id_of(&self, symbol: &str) -> Option<u32> {
        self.symbols.iter().position(|s| s == symbol).map(|i| i as u32)
    }

    /// Symbol id at every cipher position.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Ascending positions of a symbol.
    pub fn positions(&self, id: u32) -> &[usize] {
        &self.positions[id as usize]
    }

    pub fn is_locked(&self, id: u32) -> bool {
        self.locked[id as usize]
    }

    pub fn lock(&mut self, id: u32) {
        self.locked[id as usize] = true;
    }
}
