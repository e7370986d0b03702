use crate::errors::ServiceError;
use async_trait::async_trait;

/// Trait abstraction for the string key-value store carts live in.
/// Values are UTF-8 JSON text. Implementations can be in-memory, file-backed or remote.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError>;
    /// Every key currently stored; order is unspecified.
    async fn keys(&self) -> Result<Vec<String>, ServiceError>;
    /// Remove every key this backend owns.
    async fn flush_all(&self) -> Result<(), ServiceError>;
    async fn ping(&self) -> Result<(), ServiceError>;
}
