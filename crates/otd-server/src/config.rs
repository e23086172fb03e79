use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use otd_bank::RetryPolicy;
use otd_store::{BlobStore, FsBlobStore, InMemoryBlobStore};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Environment variable that names the bucket, overriding the config file.
pub const BUCKET_ENV_VAR: &str = "download_bucket";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Bucket holding every namespace's code bank. Required to serve requests.
    pub download_bucket: Option<String>,
    pub backend: StoreBackend,
    pub request_timeout_ms: u64,
    /// Attempts per issue/redeem before a contended namespace yields 503.
    pub max_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            download_bucket: None,
            backend: StoreBackend::Memory,
            request_timeout_ms: 10_000,
            max_attempts: RetryPolicy::default().max_attempts,
        }
    }
}

/// Where buckets live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local; contents are lost on exit.
    Memory,
    /// One directory per bucket under `root`.
    Filesystem { root: PathBuf },
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(format!("invalid config: {e}")))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Take the bucket name from [`BUCKET_ENV_VAR`] if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bucket) = std::env::var(BUCKET_ENV_VAR) {
            self.download_bucket = Some(bucket);
        }
        self
    }

    /// The configured bucket, or a configuration error if there is none.
    pub fn bucket(&self) -> ServerResult<&str> {
        match self.download_bucket.as_deref().map(str::trim) {
            Some(b) if !b.is_empty() => Ok(b),
            _ => Err(ServerError::Config(format!(
                "no bucket configured; set `download_bucket` or the {BUCKET_ENV_VAR} environment variable"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }

    /// Open the configured bucket on the configured backend.
    pub fn open_store(&self) -> ServerResult<Arc<dyn BlobStore>> {
        let bucket = self.bucket()?;
        otd_store::validate_key(bucket)
            .map_err(|e| ServerError::Config(format!("invalid bucket name: {e}")))?;

        match &self.backend {
            StoreBackend::Memory => {
                tracing::info!(bucket, "using in-memory bucket");
                Ok(Arc::new(InMemoryBlobStore::new()))
            }
            StoreBackend::Filesystem { root } => {
                let store = FsBlobStore::create(root.join(bucket))
                    .map_err(|e| ServerError::Config(format!("could not open bucket: {e}")))?;
                tracing::info!(bucket, dir = %store.bucket_dir().display(), "using filesystem bucket");
                Ok(Arc::new(store))
            }
        }
    }
}
