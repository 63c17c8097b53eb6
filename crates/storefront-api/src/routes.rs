use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::uploads::MAX_IMAGE_SIZE;
use crate::{auth, business, products, uploads, users};

/// Headroom for multipart boundaries and part headers around an image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Every API route. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/token", post(auth::issue_token))
        .route("/users/", post(auth::register))
        .route("/verification/email", get(auth::verify_email))
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::product_detail))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/users/me", post(users::profile))
        .route("/users/", get(users::list_users))
        .route("/business/{id}", put(business::update_business))
        .route("/products/", post(products::create_product))
        .route(
            "/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/uploadfile/profile", post(uploads::upload_profile_image))
        .route("/uploadfile/product/{id}", post(uploads::upload_product_image))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
