use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::code::Code;

/// Where a single code stands within one namespace.
///
/// The only transitions are `Unknown -> Unused` (issue) and
/// `Unused -> Expired` (redeem). `Expired` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodeState {
    /// Never issued in this namespace.
    Unknown,
    /// Issued and not yet redeemed.
    Unused,
    /// Redeemed.
    Expired,
}

/// The two-set record persisted for one namespace.
///
/// Serialized as `{"unused_codes": [...], "expired_codes": [...]}`. Sets are
/// ordered so the encoding is deterministic. Both fields are required and no
/// others are accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeBank {
    #[serde(rename = "unused_codes")]
    unused: BTreeSet<String>,
    #[serde(rename = "expired_codes")]
    expired: BTreeSet<String>,
}

impl CodeBank {
    /// An empty bank, as seen on first access to a namespace.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, code: &str) -> CodeState {
        if self.expired.contains(code) {
            CodeState::Expired
        } else if self.unused.contains(code) {
            CodeState::Unused
        } else {
            CodeState::Unknown
        }
    }

    /// Whether `code` is in either set.
    pub fn contains(&self, code: &str) -> bool {
        self.state_of(code) != CodeState::Unknown
    }

    /// Add a freshly generated code to the unused set.
    ///
    /// Returns `false` and leaves the bank untouched if the code is already
    /// known, in either state.
    pub fn insert_unused(&mut self, code: &Code) -> bool {
        if self.contains(code.as_str()) {
            return false;
        }
        self.unused.insert(code.as_str().to_string())
    }

    /// Move `code` from unused to expired.
    ///
    /// On failure returns the state the code was actually in and leaves the
    /// bank untouched.
    pub fn expire(&mut self, code: &str) -> Result<(), CodeState> {
        match self.state_of(code) {
            CodeState::Unused => {
                self.unused.remove(code);
                self.expired.insert(code.to_string());
                Ok(())
            }
            other => Err(other),
        }
    }

    pub fn unused_count(&self) -> usize {
        self.unused.len()
    }

    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unused.is_empty() && self.expired.is_empty()
    }

    /// Check that no code is both unused and expired.
    pub fn check_disjoint(&self) -> Result<(), String> {
        match self.unused.intersection(&self.expired).next() {
            Some(code) => Err(format!("code {code} is both unused and expired")),
            None => Ok(()),
        }
    }

    /// Encode as the persisted JSON record.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode a persisted JSON record.
    ///
    /// Only a JSON object with exactly the two set fields is accepted; derived
    /// struct decoding alone would also take a positional array.
    pub fn from_json_bytes(data: &[u8]) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "code bank record must be a JSON object",
            ));
        }
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Code {
        Code::parse(s).expect("test code should be well formed")
    }

    const C1: &str = "AAAAAAAAAAAAAAAAAAAA";
    const C2: &str = "BBBBBBBBBBBBBBBBBBBB";

    // -----------------------------------------------------------------------
    // State transitions
    // -----------------------------------------------------------------------

    #[test]
    fn new_bank_is_empty() {
        let bank = CodeBank::new();
        assert!(bank.is_empty());
        assert_eq!(bank.state_of(C1), CodeState::Unknown);
    }

    #[test]
    fn issue_then_expire() {
        let mut bank = CodeBank::new();
        assert!(bank.insert_unused(&code(C1)));
        assert_eq!(bank.state_of(C1), CodeState::Unused);

        bank.expire(C1).unwrap();
        assert_eq!(bank.state_of(C1), CodeState::Expired);
        assert_eq!(bank.unused_count(), 0);
        assert_eq!(bank.expired_count(), 1);
    }

    #[test]
    fn expire_twice_reports_expired() {
        let mut bank = CodeBank::new();
        bank.insert_unused(&code(C1));
        bank.expire(C1).unwrap();
        let before = bank.clone();

        assert_eq!(bank.expire(C1), Err(CodeState::Expired));
        assert_eq!(bank, before);
    }

    #[test]
    fn expire_unknown_reports_unknown() {
        let mut bank = CodeBank::new();
        assert_eq!(bank.expire("nope"), Err(CodeState::Unknown));
        assert!(bank.is_empty());
    }

    #[test]
    fn expired_code_cannot_be_reissued() {
        let mut bank = CodeBank::new();
        bank.insert_unused(&code(C1));
        bank.expire(C1).unwrap();

        assert!(!bank.insert_unused(&code(C1)));
        assert_eq!(bank.state_of(C1), CodeState::Expired);
        assert_eq!(bank.unused_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Record format
    // -----------------------------------------------------------------------

    #[test]
    fn json_field_names() {
        let mut bank = CodeBank::new();
        bank.insert_unused(&code(C2));
        bank.insert_unused(&code(C1));
        bank.expire(C2).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&bank.to_json_bytes().unwrap()).unwrap();
        assert_eq!(json["unused_codes"], serde_json::json!([C1]));
        assert_eq!(json["expired_codes"], serde_json::json!([C2]));
    }

    #[test]
    fn decodes_list_record() {
        let raw = format!(r#"{{"unused_codes": ["{C1}"], "expired_codes": ["{C2}"]}}"#);
        let bank = CodeBank::from_json_bytes(raw.as_bytes()).unwrap();
        assert_eq!(bank.state_of(C1), CodeState::Unused);
        assert_eq!(bank.state_of(C2), CodeState::Expired);
    }

    #[test]
    fn decodes_empty_record() {
        let bank =
            CodeBank::from_json_bytes(br#"{"unused_codes": [], "expired_codes": []}"#).unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn missing_fields_are_rejected() {
        assert!(CodeBank::from_json_bytes(b"{}").is_err());
        assert!(CodeBank::from_json_bytes(br#"{"unused_codes": []}"#).is_err());
        assert!(CodeBank::from_json_bytes(br#"{"expired_codes": []}"#).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(CodeBank::from_json_bytes(br#"{"unused": ["x"], "expired": ["y"]}"#).is_err());
        assert!(CodeBank::from_json_bytes(
            br#"{"unused_codes": [], "expired_codes": [], "extra": 1}"#
        )
        .is_err());
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(CodeBank::from_json_bytes(b"not json").is_err());
        assert!(CodeBank::from_json_bytes(br#"{"unused_codes": 5, "expired_codes": []}"#).is_err());
        assert!(CodeBank::from_json_bytes(b"[]").is_err());
        assert!(CodeBank::from_json_bytes(b"[[], []]").is_err());
        assert!(CodeBank::from_json_bytes(b"null").is_err());
    }

    #[test]
    fn encoding_decodes_back() {
        let mut bank = CodeBank::new();
        bank.insert_unused(&code(C1));
        bank.insert_unused(&code(C2));
        bank.expire(C1).unwrap();
        let decoded = CodeBank::from_json_bytes(&bank.to_json_bytes().unwrap()).unwrap();
        assert_eq!(decoded, bank);
    }

    #[test]
    fn disjointness_check() {
        let raw = format!(r#"{{"unused_codes": ["{C1}"], "expired_codes": ["{C1}"]}}"#);
        let bank = CodeBank::from_json_bytes(raw.as_bytes()).unwrap();
        assert!(bank.check_disjoint().is_err());
        assert!(CodeBank::new().check_disjoint().is_ok());
    }
}
