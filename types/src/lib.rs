//! Fundamental types for the krypt transfer client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account addresses, transaction hashes, ledger-unit amounts, timestamps, the
//! session and submission state, transfer drafts and records, and the error
//! taxonomy surfaced to the UI layer.

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod record;
pub mod state;
pub mod time;

pub use address::{Address, AddressError};
pub use amount::{from_ledger_units, to_ledger_units, AmountError, LedgerUnits};
pub use error::KryptError;
pub use hash::TxHash;
pub use record::{DraftField, TransactionDraft, TransactionRecord};
pub use state::{Session, SessionState, SubmissionState};
pub use time::Timestamp;
