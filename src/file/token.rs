//! Random storage tokens.
//!
//! Every upload lives in a directory named by a token drawn from a
//! cryptographically strong generator. There is no registry of issued tokens:
//! with 130 bits of entropy the filesystem itself is the only source of truth.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};

use crate::{FileUploadError, Result};

/// Number of random bits in a token.
pub const TOKEN_BITS: u32 = 130;

/// Maximum length of a rendered token (130 bits in base 32).
pub const MAX_TOKEN_LENGTH: usize = 26;

/// Mask for the bits drawn beyond the first 128.
const HIGH_MASK: u8 = (1 << (TOKEN_BITS - u128::BITS)) - 1;

const DIGITS: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Generator for storage tokens.
///
/// The generator owns its random source; callers pass it in at construction.
/// Tokens are rendered as an unsigned base-32 number (digits `0-9a-v`, no
/// leading zeros), so tokens written by older deployments use the same
/// alphabet and length.
pub struct TokenGenerator<R = StdRng> {
    rng: Mutex<R>,
}

impl TokenGenerator<StdRng> {
    /// Create a generator seeded from the operating system entropy source.
    ///
    /// Failure here is fatal for the service; it never happens per call.
    pub fn from_os_rng() -> Result<Self> {
        let rng = StdRng::try_from_os_rng().map_err(|e| FileUploadError::Entropy(e.to_string()))?;
        Ok(Self::new(rng))
    }
}

impl<R: RngCore + CryptoRng> TokenGenerator<R> {
    /// Create a generator from an explicit random source.
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Draw a fresh token.
    pub fn next_token(&self) -> String {
        let (high, low) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let low: u128 = rng.random();
            let high: u8 = rng.random::<u8>() & HIGH_MASK;
            (high, low)
        };
        render_base32(high, low)
    }
}

/// Render the 130-bit value `high:low` (`high` holds the top two bits).
fn render_base32(high: u8, low: u128) -> String {
    let mut digits = [0u8; MAX_TOKEN_LENGTH];
    for (i, digit) in digits.iter_mut().rev().enumerate() {
        let value = if i < MAX_TOKEN_LENGTH - 1 {
            (low >> (5 * i)) & 0x1f
        } else {
            // Bits 125..130 straddle the u128 boundary.
            (low >> 125) | (u128::from(high & HIGH_MASK) << 3)
        };
        *digit = DIGITS[value as usize];
    }

    let first = digits
        .iter()
        .position(|&d| d != b'0')
        .unwrap_or(MAX_TOKEN_LENGTH - 1);
    digits[first..].iter().map(|&d| d as char).collect()
}
