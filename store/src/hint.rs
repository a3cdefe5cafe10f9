//! Hint storage trait.

use crate::StoreError;

/// Persistence for the last-known transaction count.
pub trait HintStore: Send + Sync {
    /// The stored count, or `None` if nothing has been stored yet.
    fn load_count(&self) -> Result<Option<u64>, StoreError>;

    /// Replace the stored count.
    fn store_count(&self, count: u64) -> Result<(), StoreError>;
}
