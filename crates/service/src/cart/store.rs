use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::domain::{Cart, CartLineItem};
use super::seed::{seed_cart, SEED_USERS};
use crate::errors::ServiceError;
use crate::locks::KeyedLocks;
use crate::storage::KvBackend;

/// Reads and writes carts as JSON blobs keyed by user id.
///
/// The backend handle is injected; nothing here is process-global.
pub struct CartStore {
    backend: Arc<dyn KvBackend>,
    locks: KeyedLocks,
}

impl CartStore {
    pub fn new(backend: Arc<dyn KvBackend>, lock_timeout: Duration) -> Self {
        Self { backend, locks: KeyedLocks::new(lock_timeout) }
    }

    /// The user's cart, empty when nothing is stored under `user_id`.
    pub async fn get_items(&self, user_id: &str) -> Result<Cart, ServiceError> {
        if !self.backend.exists(user_id).await? {
            debug!(%user_id, "no cart stored");
            return Ok(Cart::default());
        }
        // the key can vanish between EXISTS and GET
        let Some(raw) = self.backend.get(user_id).await? else {
            return Ok(Cart::default());
        };
        let cart = Cart::decode(&raw)?;
        debug!(%user_id, items = cart.len(), "loaded cart");
        Ok(cart)
    }

    /// Append one line item and rewrite the whole cart. Appends for the same
    /// user are serialized; the stored blob is always an array.
    pub async fn add_item(&self, user_id: &str, item: CartLineItem) -> Result<Cart, ServiceError> {
        let _guard = self.locks.acquire(user_id).await?;
        let mut cart = self.get_items(user_id).await?;
        cart.push(item);
        let payload = cart.encode()?;
        if let Err(e) = self.backend.set(user_id, payload).await {
            warn!(%user_id, error = %e, "could not store cart");
            return Err(e);
        }
        info!(%user_id, items = cart.len(), "item added to cart");
        Ok(cart)
    }

    /// Every stored cart, sorted by user id. Blobs that do not decode are
    /// skipped with a warning.
    pub async fn list_all_carts(&self) -> Result<Vec<(String, Cart)>, ServiceError> {
        let keys = self.backend.keys().await?;
        let mut carts = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(raw) = self.backend.get(&key).await? else { continue };
            match Cart::decode(&raw) {
                Ok(cart) => carts.push((key, cart)),
                Err(e) => warn!(user_id = %key, error = %e, "skipping undecodable cart"),
            }
        }
        carts.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(carts)
    }

    /// Sum of `quantity * price`; a missing cart totals zero.
    pub async fn compute_total(&self, user_id: &str) -> Result<f64, ServiceError> {
        let total = self.get_items(user_id).await?.total();
        info!(%user_id, total, "computed cart total");
        Ok(total)
    }

    /// Wipe the backend and load the development fixture. Destroys every
    /// stored cart.
    pub async fn reset_with_seed_data(&self) -> Result<(), ServiceError> {
        warn!("flushing backend and inserting seed carts");
        self.backend.flush_all().await?;
        let payload = seed_cart()?.encode()?;
        for user in SEED_USERS {
            self.backend.set(user, payload.clone()).await?;
        }
        info!(users = SEED_USERS.len(), "seed carts inserted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.backend.ping().await
    }
}
