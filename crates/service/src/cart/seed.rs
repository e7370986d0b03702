//! Fixed development fixture.

use serde_json::json;

use super::domain::{Cart, CartLineItem};
use crate::errors::ServiceError;

pub const SEED_USERS: [&str; 3] = ["bill", "dan", "shri"];

/// The cart every seeded user starts with.
pub fn seed_cart() -> Result<Cart, ServiceError> {
    let items = [
        json!({"749374692hs": {
            "name": "fitband",
            "description": "fitband for any age - even babies",
            "quantity": 1,
            "price": 4.5
        }}),
        json!({"384797987238": {
            "name": "redpant",
            "description": "the most awesome redpants in the world",
            "quantity": 1,
            "price": 400
        }}),
    ];
    let items = items
        .into_iter()
        .map(CartLineItem::from_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Cart::new(items))
}
