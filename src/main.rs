use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ethio_calendar::config::Config;
use ethio_calendar::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ethio_calendar=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("CALENDAR_CONFIG").unwrap_or_else(|_| "calendar.toml".to_string());
    let config = Config::load(&config_path)?;
    info!(
        "Loaded {} extra languages from {} (strict: {})",
        config.languages.len(),
        config_path,
        config.strict
    );

    // Create app state
    let state = Arc::new(AppState::from_config(&config));
    info!("Month names available for: {}", state.months.languages().join(", "));

    let app = routes::app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr.as_str()).await?;
    info!("Server starting on http://{}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
