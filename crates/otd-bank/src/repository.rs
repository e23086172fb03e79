use std::sync::Arc;

use otd_store::{BlobStore, Precondition, StoreError, VersionToken};

use crate::bank::CodeBank;
use crate::error::{BankError, BankResult};
use crate::namespace::{Namespace, CODEBANK_KEY_SUFFIX};

/// A bank as read from the store, plus the version it was read at.
#[derive(Clone, Debug)]
pub struct LoadedBank {
    pub bank: CodeBank,
    /// `None` when the namespace had no persisted record yet.
    pub token: Option<VersionToken>,
}

/// Maps namespaces to persisted code bank records.
///
/// The store handle is injected at construction and shared; the repository
/// holds no other state, so concurrent operations coordinate only through
/// the store's conditional writes.
#[derive(Clone)]
pub struct CodeBankRepository {
    store: Arc<dyn BlobStore>,
}

impl CodeBankRepository {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Load the bank for `namespace`.
    ///
    /// A missing record yields an empty bank with no token. Undecodable
    /// bytes, or a record whose sets overlap, fail with
    /// [`BankError::CorruptData`].
    pub fn load(&self, namespace: &Namespace) -> BankResult<LoadedBank> {
        let key = namespace.store_key();
        let blob = self.store.get(&key).map_err(|source| {
            tracing::error!(%key, error = %source, "could not retrieve code bank");
            BankError::StoreRead {
                key: key.clone(),
                source,
            }
        })?;

        let Some(blob) = blob else {
            tracing::info!(%namespace, "no code bank yet, starting empty");
            return Ok(LoadedBank {
                bank: CodeBank::new(),
                token: None,
            });
        };

        let bank = CodeBank::from_json_bytes(&blob.data).map_err(|e| {
            tracing::error!(%key, error = %e, "could not parse code bank");
            BankError::CorruptData {
                key: key.clone(),
                reason: e.to_string(),
            }
        })?;
        bank.check_disjoint().map_err(|reason| {
            tracing::error!(%key, %reason, "code bank violates invariants");
            BankError::CorruptData {
                key: key.clone(),
                reason,
            }
        })?;

        tracing::debug!(
            %key,
            bytes = blob.size(),
            unused = bank.unused_count(),
            expired = bank.expired_count(),
            "loaded code bank"
        );
        Ok(LoadedBank {
            bank,
            token: Some(blob.version),
        })
    }

    /// Namespaces that have a persisted code bank, sorted.
    ///
    /// Keys in the bucket that do not end in the code bank suffix, or whose
    /// prefix is not a valid namespace, are skipped.
    pub fn namespaces(&self) -> BankResult<Vec<Namespace>> {
        let keys = self.store.keys().map_err(|source| {
            tracing::error!(error = %source, "could not list code banks");
            BankError::StoreRead {
                key: format!("*{CODEBANK_KEY_SUFFIX}"),
                source,
            }
        })?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_suffix(CODEBANK_KEY_SUFFIX))
            .filter_map(|raw| Namespace::parse(raw).ok())
            .collect())
    }

    /// Persist `bank`, provided the record is still at `token`.
    ///
    /// Returns the new version. Fails with [`BankError::Conflict`] if another
    /// writer got there first.
    pub fn save(
        &self,
        namespace: &Namespace,
        bank: &CodeBank,
        token: Option<&VersionToken>,
    ) -> BankResult<VersionToken> {
        let key = namespace.store_key();
        let data = bank.to_json_bytes().map_err(|e| BankError::StoreWrite {
            key: key.clone(),
            source: StoreError::Unavailable(format!("could not encode code bank: {e}")),
        })?;

        match self.store.put(&key, &data, Precondition::from_read(token)) {
            Ok(version) => {
                tracing::debug!(%key, bytes = data.len(), "wrote code bank");
                Ok(version)
            }
            Err(e) if e.is_precondition_failed() => {
                tracing::debug!(%key, "code bank changed since load");
                Err(BankError::Conflict { key })
            }
            Err(source) => {
                tracing::error!(%key, error = %source, "could not write code bank");
                Err(BankError::StoreWrite { key, source })
            }
        }
    }
}

impl std::fmt::Debug for CodeBankRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeBankRepository").finish_non_exhaustive()
    }
}
