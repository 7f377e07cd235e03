use bazaar::{app, config::GatewayConfig, gateway, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("bazaar=debug,axum=info,tower_http=info");

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        user_service = %config.user_service_url,
        product_service = %config.product_service_url,
        timeout_secs = config.proxy_timeout.as_secs(),
        "upstreams configured"
    );

    let state = gateway::GatewayState::new(&config)?;
    app::serve(gateway::router(state), &config.bind_addr(), gateway::SERVICE_NAME).await
}
