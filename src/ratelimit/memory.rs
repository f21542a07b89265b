//! In-process window store with per-key serialized evaluation.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use super::key::AdmissionKey;
use super::store::WindowStore;
use crate::error::{FloodgateError, Result};

/// A window store that keeps request logs in process memory.
///
/// Each key maps to a timestamp log behind its own mutex; the mutex is the
/// atomicity unit, so concurrent evaluations on the same key serialize while
/// evaluations on different keys proceed independently. Suitable for
/// single-node deployments and for deterministic tests. State is lost on
/// restart and is not shared across processes.
pub struct MemoryWindowStore {
    /// Timestamp logs indexed by rendered admission key
    entries: DashMap<String, Mutex<Vec<u64>>>,
}

impl MemoryWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live entries for `key`, counting only timestamps within
    /// `window_secs` of `now`.
    ///
    /// Diagnostic accessor; prunes nothing.
    pub fn occupancy(&self, key: &AdmissionKey, now: u64, window_secs: u64) -> usize {
        let cutoff = now.saturating_sub(window_secs);
        self.entries
            .get(&key.to_string())
            .map(|slot| slot.lock().iter().filter(|&&ts| ts >= cutoff).count())
            .unwrap_or(0)
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Drop every key whose newest entry is older than `cutoff`.
    ///
    /// Counterpart of the Redis store's idle expiry: a cleanup hint only.
    /// Correctness never depends on this running, since evaluations prune
    /// stale entries before trusting any count.
    pub fn purge_older_than(&self, cutoff: u64) {
        self.entries
            .retain(|_, slot| slot.get_mut().iter().any(|&ts| ts >= cutoff));
    }
}

impl Default for MemoryWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn evaluate(
        &self,
        key: &AdmissionKey,
        now: u64,
        window_secs: u64,
        request_limit: u64,
    ) -> Result<bool> {
        if window_secs == 0 {
            return Err(FloodgateError::Config(format!(
                "window_secs must be positive (key {})",
                key
            )));
        }

        let rendered = key.to_string();
        let cutoff = now.saturating_sub(window_secs);

        let (admitted, drained) = {
            let slot = self
                .entries
                .entry(rendered.clone())
                .or_insert_with(|| Mutex::new(Vec::new()));
            let mut log = slot.lock();

            log.retain(|&ts| ts >= cutoff);

            let admitted = (log.len() as u64) < request_limit;
            if admitted {
                log.push(now);
            }
            (admitted, log.is_empty())
        };

        if drained {
            // request_limit == 0 leaves nothing in the log; drop the key
            // rather than keep an empty slot around
            self.entries
                .remove_if(&rendered, |_, slot| slot.lock().is_empty());
        }

        trace!(key = %rendered, now, admitted, "Window evaluation");
        Ok(admitted)
    }
}
