//! Redis-backed window store running the admission algorithm as a Lua script.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::{debug, info};

use super::key::AdmissionKey;
use super::store::WindowStore;
use crate::error::{FloodgateError, Result};

/// The sliding-window-log admission algorithm, executed atomically by Redis.
///
/// Entries live in a sorted set per admission key, scored by whole-second
/// timestamp. Members carry the pre-insertion count as a suffix so several
/// admissions within the same second count individually; for a fixed `now`
/// the count only grows, which keeps members unique. The idle expiry is set
/// only on the insertion that makes the set non-empty; it is a cleanup hint,
/// never trusted, since stale entries are pruned before any count is read.
const ADMISSION_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', '(' .. (now - window))

local count = redis.call('ZCARD', key)
if count < limit then
    redis.call('ZADD', key, now, now .. '-' .. count)
    if count == 0 then
        redis.call('EXPIRE', key, window)
    end
    return 1
end
return 0
"#;

/// A window store backed by a shared Redis instance.
///
/// All multi-step state changes happen inside [`ADMISSION_SCRIPT`], which
/// Redis executes serially per invocation, so no concurrent evaluation can
/// observe a half-finished prune or insert. The store itself holds no
/// request history.
pub struct RedisWindowStore {
    connection: ConnectionManager,
    script: Script,
}

impl RedisWindowStore {
    /// Connect to Redis at `url` and load the admission script into the
    /// server.
    ///
    /// The script is compiled once here and reused for every subsequent
    /// evaluation. Failure to connect or load is fatal for initialization
    /// and should abort startup; it is not a per-request condition.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        let store = Self::with_connection(connection).await?;
        info!(url, "Connected to Redis counter store");
        Ok(store)
    }

    /// Build a store over an existing connection manager, loading the
    /// admission script into the server it points at.
    pub async fn with_connection(connection: ConnectionManager) -> Result<Self> {
        let script = Script::new(ADMISSION_SCRIPT);
        let mut conn = connection.clone();
        script.prepare_invoke().load_async(&mut conn).await?;
        debug!(hash = script.get_hash(), "Admission script loaded");
        Ok(Self { connection, script })
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
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

        let mut connection = self.connection.clone();
        let admitted: i64 = self
            .script
            .key(key.to_string())
            .arg(now)
            .arg(window_secs)
            .arg(request_limit)
            .invoke_async(&mut connection)
            .await?;

        debug!(key = %key, now, admitted = admitted == 1, "Window evaluation");
        Ok(admitted == 1)
    }
}
