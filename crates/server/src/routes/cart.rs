use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service::{
    cart::{format_total, Cart, CartLineItem},
    errors::ServiceError,
};
use tracing::info;

use crate::errors::JsonApiError;
use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CartEntry {
    pub id: String,
    pub cart: Cart,
}

#[derive(Serialize)]
pub struct AllCarts {
    #[serde(rename = "all carts")]
    pub all_carts: Vec<CartEntry>,
}

#[derive(Serialize)]
pub struct AddItemOutput {
    pub userid: String,
}

/// `{"<user>-cart": [...]}`, or 204 with an empty body when there is nothing in the cart.
pub async fn get_cart_items(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, JsonApiError> {
    metrics::CART_READS_TOTAL.inc();
    let cart = state.carts.get_items(&user_id).await?;
    if cart.is_empty() {
        info!(%user_id, "no items in cart");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let body = HashMap::from([(format!("{user_id}-cart"), cart)]);
    Ok(Json(body).into_response())
}

pub async fn get_all_carts(State(state): State<AppState>) -> Result<Json<AllCarts>, JsonApiError> {
    metrics::CART_READS_TOTAL.inc();
    let carts = state.carts.list_all_carts().await?;
    info!(count = carts.len(), "listing carts");
    let all_carts = carts
        .into_iter()
        .map(|(id, cart)| CartEntry { id, cart })
        .collect();
    Ok(Json(AllCarts { all_carts }))
}

/// Append the JSON object in the body to the user's cart. Served for GET and
/// POST; an empty body changes nothing.
pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<AddItemOutput>, JsonApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        info!(%user_id, "empty add-item body; nothing appended");
        return Ok(Json(AddItemOutput { userid: user_id }));
    }

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| JsonApiError::bad_request(format!("invalid JSON body: {e}")))?;
    let item = CartLineItem::from_value(value)?;
    let item_ids: Vec<&String> = item.as_map().keys().collect();
    info!(%user_id, item_ids = ?item_ids, "inserting item into cart");

    match state.carts.add_item(&user_id, item).await {
        Ok(_) => {
            metrics::CART_ITEMS_ADDED_TOTAL.inc();
            Ok(Json(AddItemOutput { userid: user_id }))
        }
        Err(e) => {
            match e {
                ServiceError::Busy(_) => metrics::CART_LOCK_TIMEOUTS_TOTAL.inc(),
                _ => metrics::CART_WRITE_FAILURES_TOTAL.inc(),
            }
            Err(e.into())
        }
    }
}

/// Plain-text total, e.g. `404.5` or `20.0`. A user without a cart totals `0.0`.
pub async fn cart_total(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<String, JsonApiError> {
    let total = state.carts.compute_total(&user_id).await?;
    Ok(format_total(total))
}
