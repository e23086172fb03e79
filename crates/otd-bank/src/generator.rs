use rand::distributions::{Distribution, Uniform};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::bank::CodeBank;
use crate::code::{Code, ALPHABET, CODE_LENGTH};

/// Draws codes that are unique within one bank.
///
/// Each character is sampled uniformly from [`ALPHABET`] by a
/// cryptographically secure generator. The default source is the operating
/// system's entropy pool; tests inject a seeded [`rand::rngs::StdRng`].
pub struct CodeGenerator<R = OsRng> {
    rng: R,
    symbol: Uniform<usize>,
}

impl CodeGenerator<OsRng> {
    /// Generator backed by OS entropy.
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for CodeGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> CodeGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            symbol: Uniform::from(0..ALPHABET.len()),
        }
    }

    /// Draw one candidate without checking for collisions.
    pub fn draw(&mut self) -> Code {
        let mut symbols = [0u8; CODE_LENGTH];
        for slot in symbols.iter_mut() {
            *slot = ALPHABET[self.symbol.sample(&mut self.rng)];
        }
        Code::from_symbols(symbols)
    }

    /// Draw codes until one is neither unused nor expired in `existing`.
    ///
    /// The loop has no retry bound: with 64^20 possible codes a second draw
    /// is already vanishingly rare. It exits on the first candidate that is
    /// unknown to the bank.
    pub fn generate(&mut self, existing: &CodeBank) -> Code {
        let mut collisions = 0u32;
        loop {
            let candidate = self.draw();
            if !existing.contains(candidate.as_str()) {
                if collisions > 0 {
                    tracing::debug!(collisions, "generated code after collisions");
                }
                return candidate;
            }
            collisions += 1;
            tracing::debug!(
                code = %candidate,
                collisions,
                "generated previously seen code, drawing again"
            );
        }
    }
}

impl<R> std::fmt::Debug for CodeGenerator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator").finish_non_exhaustive()
    }
}
