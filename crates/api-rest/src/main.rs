//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the triage REST API on its own.
//!
//! ## Intended use
//! Useful during development when you want the REST server and Swagger UI without the rest of
//! the workspace tooling. The workspace's main `triage-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{config_from_env, router, AppState};
use triage_core::{open_store, WorkflowEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting triage REST API on {}", addr);

    let cfg = config_from_env()?;
    let engine = WorkflowEngine::new(open_store(&cfg)?);
    let app = router(AppState::new(engine, std::env::var("API_KEY").ok()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
