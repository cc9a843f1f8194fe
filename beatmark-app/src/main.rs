//! beatmark - beat detection service
//!
//! Accepts audio uploads over HTTP and returns tempo plus accent-annotated
//! beats covering the whole track.

mod error;
mod handlers;
mod server;

use beatmark_library::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load();
    tracing::info!(
        "Config: {} (sensitivity {}, hop {}, {} beats/bar)",
        Config::config_path().display(),
        config.default_sensitivity,
        config.hop_length,
        config.beats_per_bar
    );

    server::run(config).await
}
