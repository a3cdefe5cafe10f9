//! Nullable hint store: in-memory, optionally failing on write.

use krypt_store::{HintStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct NullHintStore {
    count: Mutex<Option<u64>>,
    fail_writes: AtomicBool,
}

impl NullHintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously stored count.
    pub fn with_count(count: u64) -> Self {
        Self {
            count: Mutex::new(Some(count)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// The currently stored count (for assertions).
    pub fn count(&self) -> Option<u64> {
        *self.count.lock().unwrap()
    }

    /// Make every subsequent `store_count` fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

impl HintStore for NullHintStore {
    fn load_count(&self) -> Result<Option<u64>, StoreError> {
        Ok(*self.count.lock().unwrap())
    }

    fn store_count(&self, count: u64) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("null hint store is read-only")));
        }
        *self.count.lock().unwrap() = Some(count);
        Ok(())
    }
}
