//! User service: registration, login (token issuance) and the profile
//! endpoints protected in store-lookup mode.

pub mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{app, state::UserServiceState};

pub const SERVICE_NAME: &str = "user-service";

pub fn router(state: UserServiceState) -> Router {
    let routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/health", get(health))
        .with_state(state);

    app::with_common_layers(routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}
