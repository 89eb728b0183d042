use anyhow::Context;

use adsmarket_api::app::{self, services};
use adsmarket_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    adsmarket_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let services = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || services::build_services(&config))
            .await
            .context("service setup panicked")??
    };
    let identity = services::build_identity(&config)?;

    let app = app::build_app(services, identity);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
