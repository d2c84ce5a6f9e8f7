//! health-sync CLI
//!
//! Drives the health sync controller against a fixture provider.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use health_sync::{
    config::Config,
    export::{ExportBatch, ExportFormat},
    logging,
    provider::{FixtureProvider, HealthProvider, Platform},
    sync::{HealthSyncController, LifecycleEvents, SyncPhase, SyncState},
    transparency::{create_shared_log_with_persistence, SharedTransparencyLog},
    PRIVACY_DECLARATION, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "health-sync")]
#[command(version = VERSION)]
#[command(about = "Health-data acquisition and normalization", long_about = None)]
struct Cli {
    /// Platform to emulate (ios, android, other)
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show platform, provider availability and configuration
    Status {
        /// Fixture file standing in for the device provider
        #[arg(long)]
        fixture: Option<PathBuf>,
    },

    /// Run one sync cycle and print the snapshot
    Sync {
        /// Fixture file standing in for the device provider
        #[arg(long)]
        fixture: PathBuf,

        /// Upload the rows to the configured backend (requires backend feature)
        #[arg(long)]
        upload: bool,
    },

    /// Keep syncing on schedule until interrupted
    Watch {
        /// Fixture file standing in for the device provider
        #[arg(long)]
        fixture: PathBuf,
    },

    /// Export persistence rows for the current snapshot
    Export {
        /// Fixture file standing in for the device provider
        #[arg(long)]
        fixture: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },

    /// Show configuration
    Config,

    /// Display privacy declaration
    Privacy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(if cli.verbose { "debug" } else { "info" });

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(platform) = cli.platform {
        config.platform = Some(platform);
    }

    match cli.command {
        Commands::Status { fixture } => cmd_status(&config, fixture.as_deref()).await,
        Commands::Sync { fixture, upload } => cmd_sync(&config, &fixture, upload).await,
        Commands::Watch { fixture } => cmd_watch(&config, &fixture).await,
        Commands::Export {
            fixture,
            output,
            format,
        } => cmd_export(&config, &fixture, output.as_deref(), format).await,
        Commands::Config => cmd_config(&config),
        Commands::Privacy => cmd_privacy(&config),
    }
}

fn load_fixture(path: &Path) -> Result<Arc<FixtureProvider>> {
    let provider = FixtureProvider::from_path(path)
        .with_context(|| format!("Failed to load fixture {}", path.display()))?;
    Ok(Arc::new(provider))
}

fn open_transparency_log(config: &Config) -> SharedTransparencyLog {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    create_shared_log_with_persistence(config.transparency_path())
}

fn save_transparency_log(log: &SharedTransparencyLog) {
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }
}

fn print_unavailable_hint(config: &Config, state: &SyncState) {
    if state.phase == SyncPhase::Disabled {
        let platform = config.sync_config().platform;
        eprintln!("Health data is unavailable on platform '{platform}'.");
        if !platform.supports_health_data() {
            eprintln!("Use --platform ios to emulate a supported device.");
        }
    }
}

async fn initialized_controller(
    config: &Config,
    fixture: &Path,
    log: SharedTransparencyLog,
) -> Result<HealthSyncController<FixtureProvider>> {
    let provider = load_fixture(fixture)?;
    let mut controller =
        HealthSyncController::with_transparency_log(provider, config.sync_config(), log);
    let state = controller.initialize().await;
    print_unavailable_hint(config, &state);
    Ok(controller)
}

async fn cmd_status(config: &Config, fixture: Option<&Path>) -> Result<()> {
    let sync = config.sync_config();

    println!("health-sync Status");
    println!("==================");
    println!();
    println!(
        "Platform: {} ({})",
        sync.platform,
        if sync.platform.supports_health_data() {
            "supported ✓"
        } else {
            "unsupported ✗"
        }
    );

    if let Some(path) = fixture {
        let provider = load_fixture(path)?;
        println!(
            "Provider ({}): {}",
            path.display(),
            if provider.is_available() {
                "available ✓"
            } else {
                "unavailable ✗"
            }
        );
    }
    println!();

    println!("Configuration:");
    println!("  Refresh interval: {}s", sync.refresh_interval.as_secs());
    println!("  Workout limit: {}", sync.workout_limit);
    println!("  Data path: {}", config.data_path.display());
    println!("  Export path: {}", config.export_path.display());
    println!(
        "  Backend: {}",
        config
            .backend
            .as_ref()
            .map(|b| b.base_url.as_str())
            .unwrap_or("not configured")
    );
    print_backend_reachability(config).await;
    println!();

    let stats_path = config.transparency_path();
    if stats_path.exists() {
        let log = create_shared_log_with_persistence(stats_path);
        let counts = log.stats().counts;
        println!("Cumulative Statistics:");
        println!("  Permission requests: {}", counts.permission_requests);
        println!(
            "  Fetch cycles: {} ({} discarded)",
            counts.fetch_cycles, counts.failed_cycles
        );
        println!("  Vital samples read: {}", counts.vital_samples);
        println!("  Workouts read: {}", counts.workouts);
    }

    Ok(())
}

async fn cmd_sync(config: &Config, fixture: &Path, upload: bool) -> Result<()> {
    let log = open_transparency_log(config);
    let controller = initialized_controller(config, fixture, log.clone()).await?;
    let state = controller.state();

    println!("{}", serde_json::to_string_pretty(&state)?);

    let batch = ExportBatch::from_state(&state);
    if !batch.is_empty() {
        let path = config.export_path.join(format!(
            "health-sync-{}.json",
            Utc::now().format("%Y%m%dT%H%M%SZ")
        ));
        batch.write_to(&path, ExportFormat::Json)?;
        eprintln!("Exported {} rows to {}", batch.len(), path.display());
    }

    if upload {
        upload_batch(config, &batch).await?;
    }

    save_transparency_log(&log);
    Ok(())
}

#[cfg(feature = "backend")]
async fn print_backend_reachability(config: &Config) {
    let Some(backend) = config.backend.clone() else {
        return;
    };
    let reachable = match health_sync::BackendClient::new(backend) {
        Ok(client) => client.test_connection().await.unwrap_or(false),
        Err(e) => {
            eprintln!("Warning: {e}");
            false
        }
    };
    println!(
        "  Backend reachable: {}",
        if reachable { "yes ✓" } else { "no ✗" }
    );
}

#[cfg(not(feature = "backend"))]
async fn print_backend_reachability(_config: &Config) {}

#[cfg(feature = "backend")]
async fn upload_batch(config: &Config, batch: &ExportBatch) -> Result<()> {
    let Some(backend) = config.backend.clone() else {
        bail!("No backend configured in {}", Config::config_path().display());
    };
    let client = health_sync::BackendClient::new(backend)?;
    let response = client.upload(batch).await?;
    println!(
        "Uploaded {} health data rows and {} activities as {}",
        response.health_data_inserted,
        response.activities_inserted,
        client.device_id()
    );
    Ok(())
}

#[cfg(not(feature = "backend"))]
async fn upload_batch(_config: &Config, _batch: &ExportBatch) -> Result<()> {
    bail!("Upload requires the 'backend' feature. Rebuild with: cargo build --features backend")
}

async fn cmd_watch(config: &Config, fixture: &Path) -> Result<()> {
    let log = open_transparency_log(config);
    let provider = load_fixture(fixture)?;
    let mut controller =
        HealthSyncController::with_transparency_log(provider, config.sync_config(), log.clone());
    let mut updates = controller.subscribe();

    let lifecycle = LifecycleEvents::new();
    controller.mount(&lifecycle).await;
    let state = controller.state();
    print_unavailable_hint(config, &state);

    if !controller.is_scheduled() {
        println!("{}", serde_json::to_string_pretty(&state)?);
        controller.unmount().await;
        save_transparency_log(&log);
        return Ok(());
    }

    println!(
        "Watching (every {}s). Press Ctrl+C to stop.",
        config.sync_config().refresh_interval.as_secs()
    );
    updates.mark_changed();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.phase == SyncPhase::Idle {
                    println!("{}", serde_json::to_string(&state)?);
                }
            }
        }
    }

    println!();
    println!("Stopping...");
    controller.unmount().await;
    println!("{}", log.summary());
    save_transparency_log(&log);

    Ok(())
}

async fn cmd_export(
    config: &Config,
    fixture: &Path,
    output: Option<&Path>,
    format: ExportFormat,
) -> Result<()> {
    let log = open_transparency_log(config);
    let controller = initialized_controller(config, fixture, log.clone()).await?;
    let batch = ExportBatch::from_state(&controller.state());

    match output {
        Some(path) => {
            batch.write_to(path, format)?;
            println!("Exported {} rows to {}", batch.len(), path.display());
        }
        None => print!("{}", batch.render(format)?),
    }

    save_transparency_log(&log);
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("health-sync Configuration");
    println!("=========================");
    println!();
    println!("Config file: {}", Config::config_path().display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn cmd_privacy(config: &Config) -> Result<()> {
    println!("{PRIVACY_DECLARATION}");

    let stats_path = config.transparency_path();
    if stats_path.exists() {
        let log = create_shared_log_with_persistence(stats_path);
        println!("{}", log.summary());
    }
    Ok(())
}
