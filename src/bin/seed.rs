use storefront_api::{
    config::AppConfig,
    services::{auth_service, product_service},
    state::AppState,
    store::{MEMORY_PATH, ensure_schema, open_store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let path = match config.store_path.clone() {
        Some(path) if path != MEMORY_PATH => path,
        _ => anyhow::bail!("STORE_PATH must point at a data directory"),
    };
    let store = open_store(Some(path.as_str())).await?;
    ensure_schema(store.as_ref()).await?;

    let state = AppState::new(store, config);
    let admin_id = auth_service::ensure_default_admin(&state).await?;
    let seeded = product_service::seed_catalog(&state).await?;

    println!("Seed completed in {path}. Admin ID: {admin_id}, products added: {seeded}");
    Ok(())
}
