//! services/web/src/bin/visit3d.rs

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visit_core::ports::DocumentStore;
use web_lib::{
    adapters::{FsDocumentStore, JweIdentityResolver, TemplateRenderer},
    config::Config,
    error::ApiError,
    web::{router, AppState},
};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Adapters ---
    let store = config.save_dir.as_ref().map(|dir| {
        info!("Saving documents under {}", dir.display());
        Arc::new(FsDocumentStore::new(dir)) as Arc<dyn DocumentStore>
    });
    if store.is_none() {
        info!("SAVE_DIR not set, /save is disabled");
    }

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        identity: Arc::new(JweIdentityResolver::new(&config.key_path)),
        store,
        renderer: Arc::new(TemplateRenderer::new(&config.templates_dir)),
    });

    // --- 4. Start the Server ---
    let app = router(app_state);
    info!(
        "Start listening on {} with endpoint: {}",
        config.listen_address, config.endpoint_url
    );
    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
