use std::env;

use anyhow::Result;
use copilot_api::build_app;
use copilot_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("copilot_api");

    let kb_root = env::var("COPILOT_KB_ROOT").unwrap_or_else(|_| "kb".to_string());
    let bind = env::var("COPILOT_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app(&kb_root).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, kb_root = %kb_root, "hr copilot api started");

    axum::serve(listener, app).await?;
    Ok(())
}
