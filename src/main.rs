use std::sync::Arc;

use onboard::config::OnboardingConfig;
use onboard::onboarding::{OnboardingService, onboarding_routes};
use onboard::store::{LibSqlBackend, Repository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let port: u16 = std::env::var("ONBOARD_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let db_path =
        std::env::var("ONBOARD_DB_PATH").unwrap_or_else(|_| "./data/onboard.db".to_string());

    eprintln!("🧭 Onboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{port}/api/onboarding");
    eprintln!("   Database: {db_path}");

    // ── Database ─────────────────────────────────────────────────────────
    let db_path_ref = std::path::Path::new(&db_path);
    let repo: Arc<dyn Repository> = Arc::new(
        LibSqlBackend::new_local(db_path_ref)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {db_path}: {e}");
                std::process::exit(1);
            }),
    );

    // ── Service + routes ─────────────────────────────────────────────────
    let service = Arc::new(OnboardingService::new(repo, OnboardingConfig::default()));
    let app = onboarding_routes(service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Onboarding service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
