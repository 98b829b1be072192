//! Taskdeck server: task tracking REST API.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8000
//! cargo run --bin taskdeck-server
//!
//! # Run on custom address with a persistent data file
//! cargo run --bin taskdeck-server -- --bind 127.0.0.1:8080 --data-file tasks.json
//!
//! # Or via environment variables
//! TASKDECK_ADDR=127.0.0.1:8080 TASKDECK_DATA=tasks.json cargo run --bin taskdeck-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdeck_server::api::{self, AppState};
use taskdeck_server::config::{CliArgs, ServerConfig};
use taskdeck_server::store::TaskStore;
use taskdeck_server::users::UserDirectory;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskdeck server");

    let store = match &config.data_file {
        Some(path) => match TaskStore::open(path.clone()).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "failed to open task data file");
                std::process::exit(1);
            }
        },
        None => TaskStore::new(),
    };
    match store.data_file() {
        Some(path) => tracing::info!(path = %path.display(), tasks = store.len().await, "persisting tasks"),
        None => tracing::warn!("no data file configured; tasks are kept in memory only"),
    }

    let users = UserDirectory::from_records(config.users.clone());
    if users.is_empty() {
        tracing::warn!("no users configured; every request will be rejected as unauthorized");
    }

    let state = match AppState::with_config(store, users, &config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    match api::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskdeck server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
