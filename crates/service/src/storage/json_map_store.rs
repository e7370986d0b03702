use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use async_trait::async_trait;
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;
use crate::storage::kv_backend::KvBackend;

/// Generic key-value map store, optionally persisted to a JSON file.
///
/// With a file path every mutation rewrites the whole file while the write
/// lock is held, so the file always matches the last committed map.
/// Without one the store is purely in memory (tests, `memory` backend).
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: Option<PathBuf>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        common::env::ensure_parent_dir(&file_path)
            .await
            .map_err(ServiceError::backend)?;

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Corrupt(format!("{}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::backend)?)
                    .await
                    .map_err(ServiceError::backend)?;
                empty
            }
            Err(e) => return Err(ServiceError::backend(e)),
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path: Some(file_path) }))
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(RwLock::new(HashMap::new())), file_path: None })
    }

    async fn save(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let data = serde_json::to_vec(map).map_err(ServiceError::backend)?;
        fs::write(path, data).await.map_err(ServiceError::backend)?;
        Ok(())
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.read().await.contains_key(key)
    }

    /// Insert or update a value by key and persist. The in-memory map only
    /// changes once the file write succeeded.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        next.insert(key, value);
        self.save(&next).await?;
        *map = next;
        Ok(())
    }

    /// Drop every entry and persist the empty map.
    pub async fn clear(&self) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        self.save(&HashMap::new()).await?;
        map.clear();
        Ok(())
    }
}

#[async_trait]
impl KvBackend for JsonMapStore<String, String> {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.contains_key(&key.to_string()).await)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(JsonMapStore::get(self, &key.to_string()).await)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        self.insert(key.to_string(), value).await
    }

    async fn keys(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.list().await.into_iter().map(|(k, _)| k).collect())
    }

    async fn flush_all(&self) -> Result<(), ServiceError> {
        self.clear().await
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
