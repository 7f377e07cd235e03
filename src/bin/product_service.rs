use anyhow::Context;
use bazaar::{app, config::ServiceConfig, products, state::ProductServiceState, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("bazaar=debug,axum=info,tower_http=info");

    let config = ServiceConfig::from_env("PRODUCT_SERVICE_PORT", 8081)?;
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("create upload dir {}", config.upload_dir.display()))?;

    let state = ProductServiceState::init(&config).await?;
    let app = products::router(state, &config.upload_dir);

    app::serve(app, &config.bind_addr(), products::SERVICE_NAME).await
}
