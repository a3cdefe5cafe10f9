//! Ledger records as returned by `getAllTransactions`.

use krypt_types::{Address, LedgerUnits, Timestamp};
use serde::{Deserialize, Serialize};

/// One transfer entry exactly as the contract stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLedgerRecord {
    pub sender: Address,
    pub receiver: Address,
    pub amount: LedgerUnits,
    pub message: String,
    /// Block time of the write, epoch seconds.
    pub timestamp: Timestamp,
    pub keyword: String,
}
