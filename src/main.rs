use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{config_from_env, router, AppState};
use triage_core::{open_store, seed, WorkflowEngine};

/// Main entry point for the triage service
///
/// Serves the REST API (with Swagger UI) over the configured case store.
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRIAGE_DATABASE_PATH`: SQLite database file; unset keeps the caseload in memory
/// - `TRIAGE_STORE_MAX_ATTEMPTS`, `TRIAGE_STORE_BACKOFF_MS`, `TRIAGE_STORE_BUSY_TIMEOUT_MS`:
///   store retry and lock-wait tuning
/// - `TRIAGE_SEED_DEMO`: load the demo caseload on startup when set to `true`
/// - `API_KEY`: required in the `x-api-key` header when set
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, store startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("triage=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let seed_demo = std::env::var("TRIAGE_SEED_DEMO").is_ok_and(|v| v.eq_ignore_ascii_case("true"));

    let cfg = config_from_env()?;
    let engine = WorkflowEngine::new(open_store(&cfg)?);
    if seed_demo {
        seed::seed_demo(&engine)?;
    }

    tracing::info!("++ Starting triage REST on {}", rest_addr);

    let app = router(AppState::new(engine, std::env::var("API_KEY").ok()));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
