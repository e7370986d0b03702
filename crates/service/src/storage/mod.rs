//! Key-value backends behind the cart store
//!
//! `KvBackend` is the seam: `RedisStore` talks to a live Redis, while
//! `JsonMapStore` keeps the map in memory and optionally persists it as JSON.

pub mod kv_backend;
pub mod json_map_store;
pub mod redis_store;

pub use json_map_store::JsonMapStore;
pub use kv_backend::KvBackend;
pub use redis_store::RedisStore;
