use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use photo_inspector::application::inspector_session::InspectorOptions;
use photo_inspector::infrastructure::axum_handler::{router, AppState};
use photo_inspector::infrastructure::config::AppConfig;
use photo_inspector::infrastructure::settings_store::JsonFileSettingsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG が無ければ info、このクレートだけ debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,photo_inspector=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    let settings = JsonFileSettingsStore::open(&config.settings_path)
        .await
        .with_context(|| format!("failed to open settings at {:?}", config.settings_path))?;
    info!("Settings file {:?}", settings.path());
    let options = InspectorOptions {
        sample_stride: config.sample_stride,
        histogram_width: config.histogram_width,
        histogram_height: config.histogram_height,
    };
    let state = Arc::new(AppState::build(Arc::new(settings), options).await);

    let app = router(state, &config.frontend_dir);
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address))?;

    // サーバーの開始
    info!("Listening on http://{}", addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
