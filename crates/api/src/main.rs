use anyhow::Context;

use storekeep_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storekeep_observability::init();

    let config = AppConfig::from_env();
    let app = storekeep_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
