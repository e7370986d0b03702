//! Service layer for the cart API.
//! - Cart domain types and total arithmetic live in `cart`.
//! - `storage` hides the key-value backend behind a trait.
//! - Errors are typed; the HTTP layer decides status codes.

pub mod errors;
pub mod locks;
pub mod storage;
pub mod cart;
pub mod backend;
