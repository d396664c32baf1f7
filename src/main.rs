use std::error::Error;

use ai_llm_service::telemetry;
use api::AppConfig;
use tracing::{Level, info};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; a malformed one is not.
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.into()),
    }

    let app_layer = fmt::layer()
        .with_target(true)
        .with_timer(telemetry::ChronoRfc3339Utc)
        .with_filter(filter::filter_fn(|meta| {
            !telemetry::is_library_target(meta.target())
        }));

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .with(app_layer)
        .try_init()?;

    let cfg = AppConfig::from_env()?;
    info!(address = %cfg.address, "configuration loaded");

    api::start(cfg).await?;
    Ok(())
}
