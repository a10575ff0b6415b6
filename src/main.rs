use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use callboard::api::dashboard_router;
use callboard::config;
use callboard::state::DashboardState;
use callboard::store::{RecordStore, SheetsClient};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let Some(script_url) = config::script_url() else {
        tracing::error!("CALLBOARD_SCRIPT_URL is not set; there is no record store to reach");
        std::process::exit(1);
    };

    // The blocking HTTP client owns a background worker; build it
    // before the async runtime comes up.
    let store: Arc<dyn RecordStore> = Arc::new(SheetsClient::new(&script_url));
    let state = Arc::new(DashboardState::new());

    // Initial bulk fetch. A failure is not fatal: the server still
    // comes up so the dashboard can show the error state and retry.
    match state.refresh_from_store(store.as_ref()) {
        Ok(count) => tracing::info!(count, "Loaded patient records"),
        Err(err) => tracing::warn!(error = %err, "Initial fetch failed"),
    }

    let addr = config::bind_addr();
    let app = dashboard_router(state, store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to start async runtime");

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard address");
        tracing::info!(%addr, "Dashboard listening");
        axum::serve(listener, app)
            .await
            .expect("error while running Callboard");
    });
}
