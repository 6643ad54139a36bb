use std::sync::Arc;

use estatenest_api::app::{self, services::AppServices};
use estatenest_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    estatenest_observability::init();

    let config = AppConfig::from_env()?;
    let services = Arc::new(AppServices::from_config(config).await?);
    let bind_addr = services.config.bind_addr;

    let app = app::build_app(services);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
