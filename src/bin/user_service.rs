use bazaar::{app, config::ServiceConfig, state::UserServiceState, telemetry, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("bazaar=debug,axum=info,tower_http=info");

    let config = ServiceConfig::from_env("USER_SERVICE_PORT", 8080)?;
    let state = UserServiceState::init(&config).await?;

    app::serve(users::router(state), &config.bind_addr(), users::SERVICE_NAME).await
}
