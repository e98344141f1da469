//! Headless runtime for the Tonyn ephemeral feed.
//!
//! Loads the persisted feed over the starting feed, sweeps expired content
//! once per tick, and ends the session cleanly on Ctrl-C or when the tick
//! bound is reached, committing this session's view-once reveals.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tonyn-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Open the file backend in the data directory
//! 4. Initialize the store over the starting feed
//! 5. Install the Ctrl-C handler
//! 6. Run the tick loop
//! 7. End the session and log the result

mod error;
mod log_listener;

use std::path::PathBuf;
use std::sync::Arc;

use tonyn_core::clock::{Clock, SystemClock};
use tonyn_core::config::{LoggingConfig, TonynConfig};
use tonyn_core::runner::{self, NoOpCallback};
use tonyn_core::session::SessionControl;
use tonyn_store::{EphemeralStore, FileBackend, SeedData, starting_feed};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::RuntimeError;
use crate::log_listener::LogListener;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "tonyn-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the data directory, or the tick
/// loop fails.
#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = TonynConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config_path = %config_path.display(),
        data_dir = %config.store.data_dir.display(),
        key_prefix = %config.store.key_prefix,
        tick_interval_ms = config.session.tick_interval_ms,
        max_ticks = config.session.max_ticks,
        "tonyn-runtime starting"
    );

    // 3. Open the backend.
    let backend = FileBackend::open(&config.store.data_dir)?;

    // 4. Initialize the store.
    let clock = SystemClock;
    let now = clock.now();
    let seed = if config.store.seed_starting_feed {
        starting_feed(now)
    } else {
        SeedData::empty()
    };
    let mut store =
        EphemeralStore::initialize(backend, seed, &config.store.store_options(), now);
    store.subscribe(LogListener);

    // 5. Ctrl-C ends the session.
    let control = Arc::new(SessionControl::new(&config.session));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, ending session");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the tick loop.
    let result = runner::run_session(&mut store, &clock, &control, &mut NoOpCallback).await?;
    runner::log_session_end(&result);

    // 7. End the session.
    let status = store.persistence_status();
    let summary = store.end_session(clock.now());
    info!(
        session_id = %summary.session_id,
        committed_reveals = summary.committed_reveals,
        persistence = ?status,
        "tonyn-runtime shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
