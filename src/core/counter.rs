//! Shared counter guarded by the same mutex type as the accounts
//!
//! Used to check the exclusion primitive on its own: if N threads each perform
//! M increments, the final value is exactly N * M.

use parking_lot::Mutex;

/// A counter safe to increment from many threads
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: Mutex<u64>,
}

impl SharedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by one while holding the lock
    pub fn increment(&self) {
        let mut value = self.value.lock();
        *value += 1;
    }

    /// Current value
    pub fn value(&self) -> u64 {
        *self.value.lock()
    }
}
