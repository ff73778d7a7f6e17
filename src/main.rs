use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    config::AppConfig,
    routes::create_app,
    services::{auth_service, product_service},
    state::AppState,
    store::{ensure_schema, open_store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("APP_HOST `{}` is not an IP address", config.host))?;
    let addr = SocketAddr::from((host, config.port));

    let store = open_store(config.store_path.as_deref()).await?;
    ensure_schema(store.as_ref())
        .await
        .context("store was written by an incompatible version")?;

    let seed_on_start = config.seed_on_start;
    let state = AppState::new(store, config);
    if seed_on_start {
        auth_service::ensure_default_admin(&state).await?;
        let added = product_service::seed_catalog(&state).await?;
        tracing::info!(added, "startup seed finished");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, create_app(state)).await?;

    Ok(())
}
