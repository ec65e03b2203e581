// Settings version module
// Version numbers and nonces for optimistic locking on the management API

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Versioned resource state
#[derive(Debug)]
pub struct VersionedResource {
    pub version: AtomicU64,
    pub nonce: AtomicU64,
}

fn now_millis() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or_default()
}

impl VersionedResource {
    pub fn new() -> Self {
        Self {
            version: AtomicU64::new(now_millis()),
            nonce: AtomicU64::new(1),
        }
    }

    /// Bump the version; it is strictly increasing even within one millisecond
    pub fn increment(&self) -> (u64, u64) {
        let now = now_millis();
        let previous = self
            .version
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(now.max(v + 1))
            })
            .unwrap_or(now);
        let new_version = now.max(previous + 1);
        let new_nonce = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        (new_version, new_nonce)
    }

    pub fn get(&self) -> (u64, u64) {
        (
            self.version.load(Ordering::SeqCst),
            self.nonce.load(Ordering::SeqCst),
        )
    }
}

impl Default for VersionedResource {
    fn default() -> Self {
        Self::new()
    }
}
