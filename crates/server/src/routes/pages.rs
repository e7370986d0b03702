//! Static placeholder pages. Clearing a cart and placing an order are not
//! implemented; their routes answer with the same page as `/`.

use axum::{extract::Path, response::Html};
use tracing::info;

pub const PLACEHOLDER_PAGE: &str = "<!doctype html>\n<html>\n<head><title>Cart service</title></head>\n<body><h1>Cart service is up</h1></body>\n</html>\n";

pub async fn index() -> Html<&'static str> {
    Html(PLACEHOLDER_PAGE)
}

pub async fn clear_cart(Path(user_id): Path<String>) -> Html<&'static str> {
    info!(%user_id, "clear cart requested; not implemented");
    Html(PLACEHOLDER_PAGE)
}

pub async fn order(Path(user_id): Path<String>) -> Html<&'static str> {
    info!(%user_id, "order requested; not implemented");
    Html(PLACEHOLDER_PAGE)
}
