//! Local storage for the Krypt client.
//!
//! The client persists a single advisory value: the last transaction count it
//! observed. The ledger's own counter is authoritative; this store only seeds
//! the display until the first ledger read. Callers depend on the
//! [`HintStore`] trait so tests can swap in an in-memory implementation.

pub mod error;
pub mod file;
pub mod hint;

pub use error::StoreError;
pub use file::FileHintStore;
pub use hint::HintStore;
