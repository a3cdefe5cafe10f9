//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the client (the wallet, the ledger contract
//! behind it, local storage, time) is reached through a trait. This crate
//! provides test implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod hint;
pub mod wallet;

pub use clock::NullClock;
pub use hint::NullHintStore;
pub use wallet::{NativeTransfer, NullWallet};
