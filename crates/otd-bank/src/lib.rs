//! Single-use download codes: the code bank and its lifecycle.
//!
//! Every namespace ("version") owns one [`CodeBank`]: a set of unused codes
//! and a set of expired ones. Codes move one way only:
//!
//! ```text
//! Unknown --issue--> Unused --redeem--> Expired
//! ```
//!
//! # Key Types
//!
//! - [`Code`] -- 20 symbols from a 64-symbol alphabet
//! - [`Namespace`] -- validated namespace identifier and store key
//! - [`CodeBank`] -- the persisted two-set record
//! - [`CodeGenerator`] -- CSPRNG-backed code drawing, unique per bank
//! - [`CodeBankRepository`] -- load/save against a [`otd_store::BlobStore`]
//! - [`CodeLifecycle`] -- `issue_code` / `redeem_code` with conflict retry
//!
//! # Invariants
//!
//! 1. No code is ever both unused and expired.
//! 2. An expired code is never unused again and is never removed.
//! 3. For a given namespace and code, at most one redemption reports
//!    [`Redemption::Valid`], whatever the interleaving of callers.

pub mod bank;
pub mod code;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod namespace;
pub mod repository;

pub use bank::{CodeBank, CodeState};
pub use code::{Code, ALPHABET, CODE_LENGTH};
pub use error::{BankError, BankResult};
pub use generator::CodeGenerator;
pub use lifecycle::{CodeLifecycle, Redemption, RetryPolicy};
pub use namespace::{Namespace, CODEBANK_KEY_SUFFIX, MAX_NAMESPACE_LEN};
pub use repository::{CodeBankRepository, LoadedBank};
