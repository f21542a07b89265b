//! Triple-scope admission coordination.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::key::AdmissionKey;
use super::registry::{LimitConfig, LimitRegistry};
use super::store::WindowStore;
use crate::error::Result;

/// Outcome of one admission check across all three scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Final verdict: true only when every scope admitted
    pub admitted: bool,
    /// Whether the system-wide scope admitted
    pub global_admitted: bool,
    /// Whether the resource scope admitted
    pub resource_admitted: bool,
    /// Whether the caller-per-resource scope admitted
    pub caller_admitted: bool,
    /// Quota of the governing scope, for response headers: the first denied
    /// scope in the order global, resource, caller, or the resource scope
    /// when admitted
    pub governing_limit: LimitConfig,
}

/// Coordinates one admission check per request across the global, resource,
/// and caller-per-resource scopes.
///
/// All three scopes are evaluated unconditionally with the same `now`, and
/// the verdict is their conjunction. There is no short-circuit and no
/// rollback: a request denied at one scope still consumes quota at every
/// scope that individually admitted it. The triple is not atomic as a whole;
/// each evaluation is independently atomic, and since `now` and both configs
/// are fixed up front, interleaving with concurrent requests cannot change
/// the conjunction.
pub struct RateLimiter<S: WindowStore> {
    /// Shared counter store holding all window entries
    store: Arc<S>,
    /// Scope-keyed limit definitions
    registry: Arc<LimitRegistry>,
}

impl<S: WindowStore> RateLimiter<S> {
    /// Create a limiter over a store and a registry.
    pub fn new(store: Arc<S>, registry: Arc<LimitRegistry>) -> Self {
        Self { store, registry }
    }

    /// Registry handle, for runtime configuration updates.
    pub fn registry(&self) -> &Arc<LimitRegistry> {
        &self.registry
    }

    /// Check whether a request from `caller_id` to `resource_id` is admitted
    /// right now.
    ///
    /// Admission is a point-in-time decision: a store failure must not be
    /// retried by calling this again, since every call consumes quota at the
    /// scopes that admit it.
    pub async fn admit(&self, caller_id: &str, resource_id: &str) -> Result<AdmissionDecision> {
        self.admit_at(caller_id, resource_id, unix_now()).await
    }

    /// Same as [`RateLimiter::admit`] with an explicit evaluation time in
    /// whole seconds since the Unix epoch.
    ///
    /// One `now` is shared by all three evaluations so the scopes never see
    /// skewed windows within a single request.
    pub async fn admit_at(
        &self,
        caller_id: &str,
        resource_id: &str,
        now: u64,
    ) -> Result<AdmissionDecision> {
        let global_config = self.registry.global();
        let resource_config = self.registry.resolve(resource_id);

        let global_admitted = self
            .store
            .evaluate(
                &AdmissionKey::Global,
                now,
                global_config.window_secs,
                global_config.request_limit,
            )
            .await?;

        let resource_admitted = self
            .store
            .evaluate(
                &AdmissionKey::resource(resource_id),
                now,
                resource_config.window_secs,
                resource_config.request_limit,
            )
            .await?;

        // The caller scope applies the resource's quota per caller; there is
        // no separate caller-level quota definition.
        let caller_admitted = self
            .store
            .evaluate(
                &AdmissionKey::caller(caller_id, resource_id),
                now,
                resource_config.window_secs,
                resource_config.request_limit,
            )
            .await?;

        if !global_admitted {
            warn!("Global limit reached");
        }
        if !resource_admitted {
            warn!(resource = resource_id, "Resource limit reached");
        }
        if !caller_admitted {
            warn!(
                caller = caller_id,
                resource = resource_id,
                "Caller exceeded limit for resource"
            );
        }

        // Resource and caller scopes share one config, so any non-global
        // denial is governed by the resource config, as is an admission.
        let governing_limit = if !global_admitted {
            global_config
        } else {
            resource_config
        };

        let decision = AdmissionDecision {
            admitted: global_admitted && resource_admitted && caller_admitted,
            global_admitted,
            resource_admitted,
            caller_admitted,
            governing_limit,
        };
        debug!(
            caller = caller_id,
            resource = resource_id,
            admitted = decision.admitted,
            "Admission decision"
        );
        Ok(decision)
    }
}

/// Current time in whole seconds since the Unix epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs()
}
