//! TOTE — Pari-mutuel Settlement Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the pool snapshot from disk (or creates fresh), exposes the
//! engine over the dashboard API, and shuts down gracefully.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use tote::config;
use tote::dashboard::routes::DashboardState;
use tote::dashboard::spawn_dashboard;
use tote::engine::SettlementEngine;
use tote::storage;
use tote::treasury::{SimulatedLedger, Treasury};
use tote::types::AccountId;

const BANNER: &str = r#"
 _____ ___ _____ _____
|_   _/ _ \_   _| ____|
  | || | | || | |  _|
  | || |_| || | | |___
  |_| \___/ |_| |_____|

  Totalizator Outcome & Treasury Engine
  v0.1.0 — Pari-mutuel Settlement Core
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        pool = %cfg.pool.name,
        admin = %cfg.pool.admin,
        dashboard = cfg.dashboard.enabled,
        "TOTE starting up"
    );

    // -- Restore or create the pool ---------------------------------------

    let treasury: Arc<dyn Treasury> = Arc::new(SimulatedLedger::new());
    let state_file = cfg.storage.state_file.as_deref();

    let engine = match storage::load_snapshot(state_file)? {
        Some(snapshot) => {
            info!(
                balance = %snapshot.balance,
                stakes = snapshot.stakes.len(),
                outcome = %snapshot.announced,
                "Resumed from saved snapshot"
            );
            Arc::new(SettlementEngine::restore(snapshot, treasury.clone())?)
        }
        None => {
            let admin = AccountId::new(cfg.pool.admin.clone());
            info!(admin = %admin, "Fresh pool");
            Arc::new(SettlementEngine::new(admin, treasury.clone()))
        }
    };

    // -- Observers ---------------------------------------------------------

    // Log every committed notification for operators.
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(event = %event, "Pool notification");
        }
    });

    // -- Dashboard ---------------------------------------------------------

    if cfg.dashboard.enabled {
        let dashboard_state = Arc::new(DashboardState::new(engine.clone(), cfg.pool.name.clone()));
        spawn_dashboard(dashboard_state, cfg.dashboard.port)?;
    }

    // -- Run until shutdown ------------------------------------------------

    info!("Engine ready. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    // Save final snapshot
    if let Err(e) = storage::save_snapshot(&engine.snapshot().await, state_file) {
        error!(error = %e, "Failed to save snapshot");
    }

    info!(
        balance = %engine.balance().await,
        stakes = engine.stake_count().await,
        outcome = %engine.announced_outcome().await,
        "TOTE shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tote=info"));

    let json_logging = std::env::var("TOTE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
