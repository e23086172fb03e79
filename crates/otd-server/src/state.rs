use std::sync::Arc;
use std::time::Duration;

use otd_bank::{BankResult, CodeBankRepository, CodeLifecycle};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Shared handler state.
///
/// A server whose configuration is unusable still starts; it answers every
/// code request with 503 and logs why.
#[derive(Clone)]
pub struct AppState {
    service: Arc<Result<CodeLifecycle, String>>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(lifecycle: CodeLifecycle, request_timeout: Duration) -> Self {
        Self {
            service: Arc::new(Ok(lifecycle)),
            request_timeout,
        }
    }

    /// Build the lifecycle engine from configuration, opening the store once.
    pub fn from_config(config: &ServerConfig) -> Self {
        let service = match config.open_store() {
            Ok(store) => Ok(CodeLifecycle::with_retry_policy(
                CodeBankRepository::new(store),
                config.retry_policy(),
            )),
            Err(e) => {
                tracing::error!(error = %e, "service misconfigured, all requests will fail");
                Err(e.to_string())
            }
        };
        Self {
            service: Arc::new(service),
            request_timeout: config.request_timeout(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.service.is_ok()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn lifecycle(&self) -> ServerResult<&CodeLifecycle> {
        match &*self.service {
            Ok(lifecycle) => Ok(lifecycle),
            Err(reason) => Err(ServerError::Config(reason.clone())),
        }
    }

    /// Run a blocking lifecycle operation on the blocking pool, bounded by
    /// the request timeout.
    ///
    /// On timeout the caller gets [`ServerError::Timeout`] but the blocking
    /// task is not cancelled and may still commit its write. A 503 from a
    /// redemption therefore does not prove the code is still unused.
    pub async fn run<T, F>(&self, op: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&CodeLifecycle) -> BankResult<T> + Send + 'static,
    {
        let lifecycle = self.lifecycle()?.clone();
        let task = tokio::task::spawn_blocking(move || op(&lifecycle));
        match tokio::time::timeout(self.request_timeout, task).await {
            Ok(Ok(result)) => result.map_err(ServerError::from),
            Ok(Err(join)) => Err(ServerError::Internal(format!("task failed: {join}"))),
            Err(_) => Err(ServerError::Timeout(self.request_timeout)),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ready", &self.is_ready())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
