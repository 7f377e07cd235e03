//! Edge gateway: resolves each request against the [`RouteTable`], answers
//! `/health` and `/` itself and streams everything else to a backend.

pub mod proxy;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tracing::{error, instrument, warn};

use self::{
    proxy::{ProxyError, ServiceClient},
    routes::{target_url, RouteTable, Target, Upstream},
};
use crate::{app, config::GatewayConfig, error::ApiError};

pub const SERVICE_NAME: &str = "gateway";
pub const VERSION: &str = "1.0.0";

#[derive(Clone)]
pub struct GatewayState {
    routes: Arc<RouteTable>,
    client: ServiceClient,
    user_service_url: Arc<str>,
    product_service_url: Arc<str>,
    port: u16,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig) -> Result<Self, ProxyError> {
        Ok(Self {
            routes: Arc::new(RouteTable::standard()),
            client: ServiceClient::new(config.proxy_timeout)?,
            user_service_url: config.user_service_url.as_str().into(),
            product_service_url: config.product_service_url.as_str().into(),
            port: config.port,
        })
    }

    fn base_url(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::User => &self.user_service_url,
            Upstream::Product => &self.product_service_url,
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    let routes = Router::new().fallback(dispatch).with_state(state);
    app::with_common_layers(routes)
}

#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
async fn dispatch(State(state): State<GatewayState>, request: Request) -> Response {
    let Some(target) = state.routes.resolve(request.uri().path()) else {
        return ApiError::not_found("route not found").into_response();
    };

    match target {
        Target::Health | Target::Directory if request.method() != Method::GET => {
            ApiError::MethodNotAllowed("method not allowed".into()).into_response()
        }
        Target::Health => health(&state).into_response(),
        Target::Directory => directory(&state).into_response(),
        Target::Forward { upstream, path } => {
            let url = target_url(state.base_url(upstream), &path, request.uri().query());
            match state.client.forward(&url, request).await {
                Ok(response) => response,
                Err(e) => {
                    match &e {
                        ProxyError::Timeout(_) => warn!(error = %e, %url, "proxy timeout"),
                        ProxyError::Transport(_) => error!(error = %e, %url, "proxy failed"),
                    }
                    ApiError::Gateway("failed to reach service".into()).into_response()
                }
            }
        }
    }
}

fn health(state: &GatewayState) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "port": state.port.to_string(),
    }))
}

fn directory(state: &GatewayState) -> Json<serde_json::Value> {
    Json(json!({
        "message": "bazaar API gateway",
        "version": VERSION,
        "services": {
            "user": &*state.user_service_url,
            "product": &*state.product_service_url,
        },
        "endpoints": {
            "health": "GET /health",
            "user_register": "POST /user/register",
            "user_login": "POST /user/login",
            "user_profile": "GET /user/profile",
            "user_profile_update": "PUT /user/profile",
            "products": "GET /products",
            "product": "GET /products/:id",
            "product_create": "POST /products",
            "product_update": "PUT /products/:id",
            "product_delete": "DELETE /products/:id",
            "product_image": "POST /products/:id/image",
            "my_products": "GET /my-products",
            "uploads": "GET /uploads/:file",
        },
    }))
}
