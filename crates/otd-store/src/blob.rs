use std::fmt;

/// Opaque version marker returned by a read and checked by a conditional write.
///
/// Tokens are only meaningful to the backend that issued them. Callers compare
/// them for equality and hand them back; they never inspect the contents.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a backend-specific version string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Version token for a content hash (used by content-addressed backends).
    pub fn for_content(data: &[u8]) -> Self {
        Self(blake3::hash(data).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0[..self.0.len().min(12)];
        write!(f, "VersionToken({short})")
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A blob as read from the store, together with its current version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedBlob {
    /// The raw bytes stored under the key.
    pub data: Vec<u8>,
    /// The version to pass back in [`Precondition::Matches`] when overwriting.
    pub version: VersionToken,
}

impl VersionedBlob {
    pub fn new(data: Vec<u8>, version: VersionToken) -> Self {
        Self { data, version }
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Condition a write must satisfy for the store to accept it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Write unconditionally (last writer wins).
    None,
    /// The key must not exist yet.
    DoesNotExist,
    /// The key must exist and its current version must equal this token.
    Matches(VersionToken),
}

impl Precondition {
    /// Precondition that protects a read-modify-write cycle.
    ///
    /// A read that found nothing must be followed by a create; a read that
    /// found a version must be followed by an overwrite of that same version.
    pub fn from_read(version: Option<&VersionToken>) -> Self {
        match version {
            Some(v) => Self::Matches(v.clone()),
            None => Self::DoesNotExist,
        }
    }

    /// Check the condition against the version currently stored (if any).
    pub fn holds(&self, current: Option<&VersionToken>) -> bool {
        match (self, current) {
            (Self::None, _) => true,
            (Self::DoesNotExist, None) => true,
            (Self::DoesNotExist, Some(_)) => false,
            (Self::Matches(expected), Some(actual)) => expected == actual,
            (Self::Matches(_), None) => false,
        }
    }
}

/// Validate a store key.
///
/// Keys are flat names: non-empty, no path separators, no NUL, no leading `.`.
/// Backends that map keys onto a filesystem rely on this to stay inside
/// their bucket.
pub fn validate_key(key: &str) -> crate::StoreResult<()> {
    let reason = if key.is_empty() {
        Some("key must not be empty")
    } else if key.starts_with('.') {
        Some("key must not start with '.'")
    } else if key.contains(['/', '\\', '\0']) {
        Some("key must not contain path separators or NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(crate::StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}
