//! Window store trait for abstracting Redis-backed and in-process stores.

use async_trait::async_trait;

use super::key::AdmissionKey;
use crate::error::Result;

/// One atomic sliding-window admission evaluation against a shared store.
///
/// This trait abstracts over the [`super::RedisWindowStore`] and the
/// [`super::MemoryWindowStore`] so the coordinator can work with either.
/// Implementations must run the whole prune/count/insert sequence as a
/// single indivisible unit per key: no concurrent evaluation on the same
/// key may observe an intermediate state. Evaluations on different keys
/// are fully independent.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Evaluate one admission for `key` at `now` (whole seconds since the
    /// epoch) under the given window and limit.
    ///
    /// Prunes entries older than `now - window_secs`, then admits and
    /// records `now` only if fewer than `request_limit` entries remain.
    /// A `request_limit` of zero never admits. A `window_secs` of zero is
    /// a configuration error and fails fast with
    /// [`crate::error::FloodgateError::Config`] rather than silently
    /// admitting or denying.
    async fn evaluate(
        &self,
        key: &AdmissionKey,
        now: u64,
        window_secs: u64,
        request_limit: u64,
    ) -> Result<bool>;
}
