//! Backend selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use configs::{BackendConfig, BackendKind};
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::{JsonMapStore, KvBackend, RedisStore};

/// Open the configured backend once. Callers share the returned handle.
pub async fn connect(cfg: &BackendConfig) -> Result<Arc<dyn KvBackend>, ServiceError> {
    let backend: Arc<dyn KvBackend> = match cfg.kind {
        BackendKind::Redis => {
            let op_timeout = Duration::from_millis(cfg.op_timeout_ms);
            Arc::new(RedisStore::connect(&cfg.redis_url, &cfg.key_prefix, op_timeout).await?)
        }
        BackendKind::File => JsonMapStore::<String, String>::new(cfg.file_path.as_str()).await?,
        BackendKind::Memory => JsonMapStore::<String, String>::in_memory(),
    };
    info!(kind = ?cfg.kind, "cart backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_connects() -> Result<(), anyhow::Error> {
        let cfg = BackendConfig { kind: BackendKind::Memory, ..BackendConfig::default() };
        let kv = connect(&cfg).await?;
        kv.ping().await?;
        assert!(kv.keys().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_creates_its_file() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("cart_backend_{}", uuid::Uuid::new_v4()));
        let path = dir.join("carts.json");
        let cfg = BackendConfig {
            kind: BackendKind::File,
            file_path: path.to_string_lossy().into_owned(),
            ..BackendConfig::default()
        };
        let kv = connect(&cfg).await?;
        kv.set("bill", "[]".into()).await?;
        assert!(tokio::fs::metadata(&path).await?.is_file());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_redis_is_an_error() {
        let cfg = BackendConfig {
            kind: BackendKind::Redis,
            redis_url: "redis://127.0.0.1:1/0".into(),
            op_timeout_ms: 300,
            ..BackendConfig::default()
        };
        assert!(connect(&cfg).await.is_err());
    }
}
