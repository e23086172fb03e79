//! Issue and redeem as atomic transitions over a namespace's code bank.
//!
//! Each operation is a full load -> mutate -> save cycle against the store.
//! The save is conditional on the version read by the load; if another
//! writer got there first the cycle restarts from the load, up to
//! [`RetryPolicy::max_attempts`] times. Nothing is cached between calls.

use std::time::Duration;

use rand::Rng;

use crate::bank::{CodeBank, CodeState};
use crate::code::Code;
use crate::error::{BankError, BankResult};
use crate::generator::CodeGenerator;
use crate::namespace::Namespace;
use crate::repository::{CodeBankRepository, LoadedBank};

/// Result of presenting a code for redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Redemption {
    /// The code was unused and is now expired. Reported at most once per code.
    Valid,
    /// The code had already been redeemed.
    Expired,
    /// The code was never issued in this namespace.
    Invalid,
}

impl std::fmt::Display for Redemption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Expired => write!(f, "expired"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// How hard to retry a cycle that lost a conditional write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Base delay before a retry; scaled by attempt number, plus jitter.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            backoff: Duration::from_millis(5),
        }
    }
}

impl RetryPolicy {
    /// Retry immediately; for tests.
    pub fn no_backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let base = self.backoff * attempt;
        let jitter_us = rand::thread_rng().gen_range(0..=self.backoff.as_micros() as u64);
        base + Duration::from_micros(jitter_us)
    }
}

/// The code lifecycle engine.
#[derive(Clone, Debug)]
pub struct CodeLifecycle {
    repository: CodeBankRepository,
    retry: RetryPolicy,
}

impl CodeLifecycle {
    pub fn new(repository: CodeBankRepository) -> Self {
        Self::with_retry_policy(repository, RetryPolicy::default())
    }

    pub fn with_retry_policy(repository: CodeBankRepository, retry: RetryPolicy) -> Self {
        Self { repository, retry }
    }

    /// Generate a new code, record it as unused and return it.
    ///
    /// The code is returned only after the bank containing it has been
    /// saved; on failure it is discarded.
    pub fn issue_code(&self, namespace: &Namespace) -> BankResult<Code> {
        let code = self.with_retries(namespace, "issue", || {
            let LoadedBank { mut bank, token } = self.repository.load(namespace)?;
            let code = CodeGenerator::new().generate(&bank);
            bank.insert_unused(&code);
            self.repository.save(namespace, &bank, token.as_ref())?;
            Ok(code)
        })?;
        tracing::info!(%namespace, %code, "issued new code");
        Ok(code)
    }

    /// Redeem `code`: unused codes become expired and report
    /// [`Redemption::Valid`] exactly once.
    ///
    /// Expired and unknown codes are reported without writing to the store.
    pub fn redeem_code(&self, namespace: &Namespace, code: &str) -> BankResult<Redemption> {
        let outcome = self.with_retries(namespace, "redeem", || {
            let LoadedBank { mut bank, token } = self.repository.load(namespace)?;
            match bank.expire(code) {
                Ok(()) => {
                    self.repository.save(namespace, &bank, token.as_ref())?;
                    Ok(Redemption::Valid)
                }
                Err(CodeState::Expired) => Ok(Redemption::Expired),
                Err(_) => Ok(Redemption::Invalid),
            }
        })?;
        tracing::info!(%namespace, code, %outcome, "redemption checked");
        Ok(outcome)
    }

    /// Read-only view of a namespace's bank.
    pub fn inspect(&self, namespace: &Namespace) -> BankResult<CodeBank> {
        Ok(self.repository.load(namespace)?.bank)
    }

    /// Every namespace with a persisted bank.
    pub fn namespaces(&self) -> BankResult<Vec<Namespace>> {
        self.repository.namespaces()
    }

    fn with_retries<T>(
        &self,
        namespace: &Namespace,
        op: &'static str,
        mut attempt_fn: impl FnMut() -> BankResult<T>,
    ) -> BankResult<T> {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match attempt_fn() {
                Err(e) if e.is_conflict() => {
                    tracing::debug!(%namespace, op, attempt, "conflict, retrying from load");
                    if attempt < max_attempts {
                        std::thread::sleep(self.retry.delay_for(attempt));
                    }
                }
                other => return other,
            }
        }
        tracing::warn!(%namespace, op, max_attempts, "giving up after repeated conflicts");
        Err(BankError::Contended {
            namespace: namespace.to_string(),
            attempts: max_attempts,
        })
    }
}
