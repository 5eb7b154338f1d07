use crate::model::corpus::normalize;

/// Diagnostic comparison against a known solution. Never feeds back into
/// acceptance; it only drives the separate proximity-best tracker.
pub trait KnownPlaintextOracle: Send + Sync {
    /// Proximity of `decoded` to the known solution, 0.0 to 100.0.
    fn proximity(&self, decoded: &str) -> f64;
}

/// Percentage of positions whose decoded letter equals the known plaintext.
#[derive(Debug, Clone)]
pub struct KnownPlaintext {
    plaintext: Vec<char>,
}

impl KnownPlaintext {
    pub fn new(plaintext: &str) -> Self {
        Self {
            plaintext: plaintext.chars().collect(),
        }
    }

    /// Normalizes free text the same way corpora are normalized.
    pub fn from_text(text: &str, alphabet: &str) -> Self {
        Self {
            plaintext: normalize(text, alphabet),
        }
    }

    pub fn len(&self) -> usize {
        self.plaintext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plaintext.is_empty()
    }
}

impl KnownPlaintextOracle for KnownPlaintext {
    fn proximity(&self, decoded: &str) -> f64 {
        if self.plaintext.is_empty() {
            return 0.0;
        }
        let matches = decoded
            .chars()
            .zip(self.plaintext.iter())
            .filter(|(a, b)| a == *b)
            .count();
        matches as f64 * 100.0 / self.plaintext.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proximity_is_a_percentage() {
        let known = KnownPlaintext::new("abcd");
        assert_eq!(known.proximity("abcd"), 100.0);
        assert_eq!(known.proximity("abzz"), 50.0);
        assert_eq!(known.proximity("ab"), 50.0);
        assert_eq!(known.proximity(""), 0.0);
    }
}
