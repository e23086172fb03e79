use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of characters in every issued code.
pub const CODE_LENGTH: usize = 20;

/// The 64 symbols codes are drawn from. Six bits per character, 120 bits per code.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// A single-use download code.
///
/// Codes produced by the [`CodeGenerator`](crate::CodeGenerator) are always
/// well formed. Codes presented for redemption are plain strings and are
/// looked up verbatim; see [`Code::is_well_formed`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    /// Accept a string as a code if it has the issued shape.
    #[cfg(test)]
    pub(crate) fn parse(s: &str) -> Option<Self> {
        Self::is_well_formed(s).then(|| Self(s.to_string()))
    }

    /// Exactly [`CODE_LENGTH`] characters, all from [`ALPHABET`].
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == CODE_LENGTH && s.bytes().all(|b| ALPHABET.contains(&b))
    }

    pub(crate) fn from_symbols(symbols: [u8; CODE_LENGTH]) -> Self {
        Self(symbols.iter().map(|&b| char::from(b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
