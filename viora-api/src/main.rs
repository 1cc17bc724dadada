mod app_state;
mod auth;
mod config;
mod domain;
mod middleware;
mod repositories;
mod router;
mod routes;
mod search;
mod services;

use mongodb::Client;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::config::read_config;
use crate::repositories::ensure_indexes;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,viora_api=debug,tower_http=debug")),
        )
        .init();

    let settings = read_config().expect("Failed to read configuration");

    let client = Client::with_uri_str(&settings.database.uri)
        .await
        .expect("Failed to connect to MongoDB");
    let db = client.database(&settings.database.database_name);

    ensure_indexes(&db).await.expect("Failed to create indexes");

    let app = router::create(db, &settings);

    let address = format!(
        "{}:{}",
        settings.application.host, settings.application.port
    );
    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
