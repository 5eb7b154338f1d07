pub mod count;
pub mod encipher;
pub mod solve;
pub mod transposition;

use cipherforge::solver::{CancellationToken, ProgressCallback};
use std::thread;
use std::time::{Duration, Instant};

/// Prints a line per finished epoch to stderr.
pub struct EpochReporter {
    start: Instant,
    quiet: bool,
}

impl EpochReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            start: Instant::now(),
            quiet,
        }
    }
}

impl ProgressCallback for EpochReporter {
    fn on_epoch_complete(&self, epoch: usize, best_score: f64) -> bool {
        if !self.quiet {
            eprintln!(
                "   ⏱️  epoch {:>3} done after {:.1?} | best {:.4}",
                epoch,
                self.start.elapsed(),
                best_score
            );
        }
        true
    }

    fn on_key_length_epoch_complete(
        &self,
        key_length: usize,
        epoch: usize,
        best_score: f64,
    ) -> bool {
        if !self.quiet {
            eprintln!(
                "   ⏱️  key length {:>2} epoch {:>3} done after {:.1?} | best {:.4}",
                key_length,
                epoch,
                self.start.elapsed(),
                best_score
            );
        }
        true
    }
}

/// Token that fires on its own once `seconds` have passed.
pub fn deadline_token(seconds: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();
    if let Some(secs) = seconds {
        let t = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            t.cancel();
        });
    }
    token
}
