//! Client for the transfer ledger contract.
//!
//! The ledger is an external contract exposing three calls:
//! `addToBlockchain` (write), `getAllTransactions` and `getTransactionCount`
//! (reads). This crate encodes and decodes those calls (Solidity ABI), binds
//! them to the wallet's current signer, and waits for write settlement with
//! a bounded timeout.

pub mod abi;
pub mod client;
pub mod error;
pub mod interface;
pub mod record;

pub use abi::AbiError;
pub use client::{LedgerClient, LedgerContract, LedgerHandle, PendingTransfer};
pub use error::LedgerError;
pub use interface::{InterfaceError, LedgerInterface};
pub use krypt_wallet_core::TransactionReceipt;
pub use record::RawLedgerRecord;
