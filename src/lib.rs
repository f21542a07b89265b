//! Floodgate - Multi-Scope Sliding Window Rate Limiting
//!
//! This crate admits or rejects incoming work items against per-scope quotas
//! shared across many concurrent callers. Every admission is checked against
//! a system-wide quota, the target resource's quota, and the caller's own
//! share of that resource's quota, and is allowed only when all three scopes
//! have capacity. Each check runs a sliding-window-log algorithm as a single
//! atomic unit inside a shared counter store (Redis in production, an
//! in-process store for single-node deployments and tests).
//!
//! Store failures surface as [`error::FloodgateError::Store`] from
//! [`ratelimit::RateLimiter::admit`]; Floodgate never decides fail-open vs
//! fail-closed on its own. Integrators must map that error to an explicit
//! policy: silently admitting defeats the limiter, silently denying causes
//! outages.

pub mod config;
pub mod error;
pub mod ratelimit;
