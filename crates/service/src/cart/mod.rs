//! Shopping carts
//!
//! A cart is an ordered list of line items stored as one JSON array per user
//! id. `CartStore` owns every read-modify-write against the backend.

pub mod domain;
pub mod seed;
pub mod store;

pub use domain::{format_total, Cart, CartLineItem, LineItemRecord};
pub use store::CartStore;
