//! Example consumer: a separate Rust project that uses app-config-store as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Set `DEFAULT_DATA_FAIR`, and `DATA_FAIR_CONFIG` to run embedded.

use app_config_store::{ConfigStore, ReqwestClient, Shell};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("app_config_store=info")),
        )
        .init();

    let loaded = app_config_store::load_from_env()?;
    let http = Arc::new(ReqwestClient::new()?);
    // notifications go to the log
    let store = ConfigStore::new(loaded.embed, http, Shell::logging());

    let mut changes = store.subscribe();
    let watcher = tokio::spawn(async move {
        let mut revisions = 0u64;
        while changes.changed().await.is_ok() {
            revisions = *changes.borrow_and_update();
        }
        revisions
    });

    store.initialize(loaded.env).await;

    let state = store.snapshot();
    if let Some(url) = store.default_data_fair_url() {
        tracing::info!("default catalog: {}", url);
    }
    println!("{}", serde_json::to_string_pretty(&state)?);

    drop(store);
    let revisions = watcher.await?;
    tracing::info!(
        revisions,
        datasets = state.datasets.len(),
        remote_services = state.remote_services.len(),
        "store settled"
    );
    Ok(())
}
