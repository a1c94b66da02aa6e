mod app;
mod digits;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};
use updown_core::{
    api::ApiClient,
    config::{self, AppConfig},
    sync::Bootstrap,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let client = ApiClient::new(&config)?;
    let identity = config.identity();

    let (sync_tx, sync_rx) = mpsc::channel(16);
    match identity.clone() {
        Some(identity) => {
            let bootstrap = Bootstrap::new(client.clone(), identity);
            let sender = sync_tx.clone();
            tokio::spawn(async move {
                bootstrap.run(sender).await;
            });
        }
        None => {
            tracing::warn!("user_id/bot_username not configured; running the local demo loop");
        }
    }

    let mut app = app::UpDownApp::new(config, client, identity);
    app.attach_sync(sync_tx, sync_rx);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("updown.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
