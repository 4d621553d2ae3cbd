use std::sync::Arc;

use sovoli_gateway::app::app;
use sovoli_gateway::config;
use sovoli_gateway::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SECURITY_JWT_SECRET etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Sovoli gateway in {:?} mode", config.environment);

    let state = AppState::from_config(config)
        .unwrap_or_else(|e| panic!("failed to build gateway state: {}", e));
    let app = app(Arc::new(state));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Sovoli gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
