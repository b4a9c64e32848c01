use std::error::Error;
use std::net::SocketAddr;

use itinerary_server::cache::{CacheConfig, CachedProvider};
use itinerary_server::provider::{FixtureProvider, MobilePageClient, ProviderConfig, Source};
use itinerary_server::replan::ReplanConfig;
use itinerary_server::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("itinerary_server=info")),
        )
        .init();

    // Saved pages take precedence over the live source
    let source = match std::env::var("TIMETABLE_FIXTURES") {
        Ok(dir) => {
            let fixtures = FixtureProvider::new(&dir)?;
            info!(dir = %dir, details = fixtures.detail_handles().len(), "serving saved timetable pages");
            Source::Fixtures(fixtures)
        }
        Err(_) => {
            let client = MobilePageClient::new(provider_config())?;
            info!("serving live timetable pages");
            Source::Live(client)
        }
    };

    let provider = CachedProvider::new(source, &CacheConfig::default());
    let state = AppState::new(provider, ReplanConfig::default());
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    info!("Itinerary server listening on http://{addr}");
    info!("  GET  /health                  - Health check");
    info!("  GET  /connections             - List connections");
    info!("  GET  /connections/detail      - Fetch an itinerary");
    info!("  POST /itinerary/alternatives  - Alternatives after a missed connection");
    info!("  POST /itinerary/replan        - Replan after a missed connection");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn provider_config() -> ProviderConfig {
    let mut config = ProviderConfig::default();
    if let Ok(url) = std::env::var("TIMETABLE_BASE_URL") {
        config = config.with_base_url(url);
    }
    if let Ok(secs) = std::env::var("TIMETABLE_TIMEOUT_SECS") {
        match secs.parse() {
            Ok(secs) => config = config.with_timeout(secs),
            Err(_) => warn!(value = %secs, "ignoring invalid TIMETABLE_TIMEOUT_SECS"),
        }
    }
    config
}
