//! HTTP route handlers for the shop.
//!
//! Every route is either a view (render a page through the model) or a
//! mutation (ask the model for the next state, then redirect).
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Storefront (views)
//! GET  /                             - Product grid with cart sidebar
//! GET  /products/{id}                - Product detail
//! GET  /cart                         - Cart detail
//!
//! # Cart (mutations, 303 redirect)
//! GET  /cart/add/{id}                - Add one unit, back to /
//! GET  /cart/remove/{id}             - Remove line item, back to /cart
//!
//! # Admin
//! GET  /admin/products               - Product table
//! GET  /admin/products/new           - New product form
//! POST /admin/products               - Create product
//! GET  /admin/products/{id}/edit     - Edit product form
//! PUT  /admin/products/{id}          - Update product
//! POST /admin/products/{id}          - Update product (form with _method=PUT)
//! GET  /admin/products/{id}/delete   - Delete product
//! ```

pub mod admin;
pub mod cart;
pub mod storefront;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(storefront::cart))
        .route("/add/{id}", get(cart::add))
        .route("/remove/{id}", get(cart::remove))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route("/products/new", get(admin::new_form))
        .route(
            "/products/{id}",
            put(admin::update).post(admin::update_via_form),
        )
        .route("/products/{id}/edit", get(admin::edit_form))
        .route("/products/{id}/delete", get(admin::delete))
}

/// Create all routes for the shop.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Storefront views
        .route("/", get(storefront::products))
        .route("/products/{id}", get(storefront::product))
        // Cart
        .nest("/cart", cart_routes())
        // Admin
        .nest("/admin", admin_routes())
}
