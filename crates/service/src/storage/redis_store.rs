use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::errors::ServiceError;
use crate::storage::kv_backend::KvBackend;

/// Redis-backed store. One multiplexed connection is opened at startup and
/// shared by every request; clones are cheap handles onto the same socket.
///
/// Keys are stored as `{prefix}{key}`. With an empty prefix the layout is
/// the plain `user id -> cart json` mapping.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    prefix: String,
    op_timeout: Duration,
}

impl RedisStore {
    /// Open the connection and ping once. Any failure is returned to the
    /// caller; there is no retry.
    pub async fn connect(url: &str, prefix: &str, op_timeout: Duration) -> Result<Self, ServiceError> {
        let client = redis::Client::open(url).map_err(ServiceError::backend)?;
        let conn = timeout(op_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| ServiceError::Backend(format!("connect timed out after {op_timeout:?}")))?
            .map_err(ServiceError::backend)?;
        let store = Self { conn, prefix: prefix.to_string(), op_timeout };
        store.ping().await?;
        info!(prefix = %store.prefix, "connected to redis");
        Ok(store)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.op_timeout, f(self.conn.clone())).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(ServiceError::Backend(format!("redis {op}: {e}"))),
            Err(_) => Err(ServiceError::Backend(format!(
                "redis {op} timed out after {:?}",
                self.op_timeout
            ))),
        }
    }

    async fn prefixed_keys(&self) -> Result<Vec<String>, ServiceError> {
        let pattern = format!("{}*", escape_glob(&self.prefix));
        self.run("KEYS", |mut conn| async move { conn.keys(pattern).await })
            .await
    }
}

#[async_trait]
impl KvBackend for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        let key = self.full_key(key);
        self.run("EXISTS", |mut conn| async move { conn.exists(key).await })
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let key = self.full_key(key);
        self.run("GET", |mut conn| async move { conn.get(key).await })
            .await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        let key = self.full_key(key);
        self.run("SET", |mut conn| async move { conn.set(key, value).await })
            .await
    }

    async fn keys(&self) -> Result<Vec<String>, ServiceError> {
        let keys = self.prefixed_keys().await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect())
    }

    async fn flush_all(&self) -> Result<(), ServiceError> {
        if self.prefix.is_empty() {
            debug!("flushing redis database");
            return self
                .run("FLUSHDB", |mut conn| async move {
                    redis::cmd("FLUSHDB").query_async(&mut conn).await
                })
                .await;
        }
        let keys = self.prefixed_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }
        debug!(count = keys.len(), prefix = %self.prefix, "deleting prefixed keys");
        self.run("DEL", |mut conn| async move { conn.del(keys).await })
            .await
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        let pong: String = self
            .run("PING", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        if pong.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(ServiceError::Backend(format!("unexpected PING reply `{pong}`")))
        }
    }
}

/// Escape glob metacharacters so a prefix matches literally in `KEYS`.
fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
