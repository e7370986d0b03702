use std::sync::Arc;

use service::cart::CartStore;

/// Shared handler state. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<CartStore>,
}

impl AppState {
    pub fn new(carts: CartStore) -> Self {
        Self { carts: Arc::new(carts) }
    }
}
