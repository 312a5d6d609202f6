use brand_dashboard::{
    router, source::JsonFileSource, spawn_insert_listener, ui::DashboardView, AppState, Dashboard,
    DashboardConfig, SyncOutcome,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = DashboardConfig::from_env();
    info!(
        data_path = %config.data_path.display(),
        min_date = %config.sync.min_date,
        "starting dashboard"
    );

    let source = Arc::new(JsonFileSource::new(
        config.data_path.clone(),
        config.sync.table.clone(),
    ));
    let mut session = Dashboard::new(
        source.clone(),
        config.sync.clone(),
        config.session.clone(),
        DashboardView::default(),
    );
    let inserts = session.subscribe();
    if let SyncOutcome::Failed(message) = session.load().await {
        warn!("initial load failed, serving empty dashboard: {message}");
    }

    let state = AppState::new(session, source);
    let listener_task = spawn_insert_listener(state.clone(), inserts);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    listener_task.abort();
    info!("session closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
