//! Namespace validation.
//!
//! A namespace selects one independent code bank and becomes part of a store
//! key, so it is restricted to a conservative charset:
//! - Must be 1 to [`MAX_NAMESPACE_LEN`] characters
//! - Only ASCII letters, digits, `_`, `-` and `.`
//! - Must not start with `.`

use std::fmt;

use crate::error::{BankError, BankResult};

/// Longest accepted namespace.
pub const MAX_NAMESPACE_LEN: usize = 64;

/// Suffix appended to a namespace to form its store key.
pub const CODEBANK_KEY_SUFFIX: &str = "-codebank";

/// A validated namespace ("version") identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Validate and wrap a caller-supplied namespace.
    ///
    /// ```
    /// use otd_bank::Namespace;
    ///
    /// assert!(Namespace::parse("offline").is_ok());
    /// assert!(Namespace::parse("v1.2").is_ok());
    /// assert!(Namespace::parse("").is_err());
    /// assert!(Namespace::parse("../etc").is_err());
    /// ```
    pub fn parse(raw: &str) -> BankResult<Self> {
        let invalid = |reason: &str| BankError::InvalidNamespace {
            namespace: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("namespace must not be empty"));
        }
        if raw.len() > MAX_NAMESPACE_LEN {
            return Err(invalid("namespace is too long"));
        }
        if raw.starts_with('.') {
            return Err(invalid("namespace must not start with '.'"));
        }
        if let Some(ch) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(invalid(&format!("contains forbidden character: {ch:?}")));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store key holding this namespace's code bank.
    pub fn store_key(&self) -> String {
        format!("{}{CODEBANK_KEY_SUFFIX}", self.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_namespaces() {
        for ns in ["test", "offline", "v1", "v1.2.3", "game_beta-2", "A"] {
            assert!(Namespace::parse(ns).is_ok(), "expected {ns:?} to be valid");
        }
    }

    #[test]
    fn invalid_namespaces() {
        for ns in ["", ".hidden", "..", "a/b", "a b", "a\\b", "caf\u{e9}", "x%2F"] {
            assert!(Namespace::parse(ns).is_err(), "expected {ns:?} to be invalid");
        }
    }

    #[test]
    fn length_limit() {
        let max = "a".repeat(MAX_NAMESPACE_LEN);
        assert!(Namespace::parse(&max).is_ok());
        let over = "a".repeat(MAX_NAMESPACE_LEN + 1);
        assert!(Namespace::parse(&over).is_err());
    }

    #[test]
    fn store_key_format() {
        let ns = Namespace::parse("test").unwrap();
        assert_eq!(ns.store_key(), "test-codebank");
        assert!(otd_store::validate_key(&ns.store_key()).is_ok());
    }

    #[test]
    fn error_carries_reason() {
        let err = Namespace::parse("a/b").unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("forbidden character"));
    }
}
