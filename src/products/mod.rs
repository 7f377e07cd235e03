//! Product service: public catalogue reads, owner-scoped writes (claims-trust
//! auth) and image attachment with static serving of uploads.

pub mod authz;
pub mod dto;
pub mod handlers;
pub mod pagination;
pub mod repo;

use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::{app, state::ProductServiceState, storage::PUBLIC_PREFIX};

pub const SERVICE_NAME: &str = "product-service";

const IMAGE_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10MB

pub fn router(state: ProductServiceState, upload_dir: &Path) -> Router {
    let routes = Router::new()
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/products/:id/image",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
        )
        .route("/my-products", get(handlers::my_products))
        .route("/health", get(health))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .with_state(state);

    app::with_common_layers(routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}
