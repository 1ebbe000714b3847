//! # Chime CLI
//!
//! Schedule, inspect and cancel deferred notifications.
//!
//! Usage:
//!   chime schedule --in 30 -b "Stretch" -i 7     # Fire in 30s, wait for it
//!   chime schedule --at 2026-10-16T15:00:00Z -b "Standup" -i 1 -p high
//!   chime list                                   # Pending entries
//!   chime cancel 7                               # Cancel by notification id
//!   chime cancel-all                             # Cancel everything
//!   chime init                                   # Write default config

use anyhow::{Context, Result};
use chime_core::ChimeConfig;
use chime_core::types::{Notification, Priority};
use chime_scheduler::{ChannelPresenter, NotificationScheduler, TokioWakeupService};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chime",
    version,
    about = "🔔 Chime: deferred notifications that survive restarts",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a notification and wait for it to fire
    Schedule {
        /// Seconds from now
        #[arg(long = "in", conflicts_with = "at", required_unless_present = "at")]
        in_secs: Option<u64>,

        /// Absolute time (RFC 3339)
        #[arg(long)]
        at: Option<String>,

        /// Notification text
        #[arg(short, long)]
        body: String,

        /// Notification id (shared ids are cancelled together)
        #[arg(short, long)]
        id: i32,

        /// Priority: standard or high
        #[arg(short, long, default_value = "standard", value_parser = parse_priority)]
        priority: Priority,

        /// Extra parameter, KEY=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Cancel every pending entry with this notification id
    Cancel {
        id: i32,
    },

    /// Cancel all pending entries
    CancelAll,

    /// List pending entries
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Repair half-written entries left by a crash
    Recover,

    /// Write the default config file
    Init,

    /// Show configuration and store status
    Info,
}

fn parse_priority(s: &str) -> std::result::Result<Priority, String> {
    match s.to_ascii_lowercase().as_str() {
        "standard" | "0" => Ok(Priority::Standard),
        "high" | "1" => Ok(Priority::High),
        other => Err(format!("unknown priority '{other}' (expected standard or high)")),
    }
}

fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    let (k, v) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if k.is_empty() {
        return Err("parameter key must not be empty".into());
    }
    Ok((k.to_string(), v.to_string()))
}

fn trigger_time_ms(in_secs: Option<u64>, at: Option<&str>) -> Result<i64> {
    match (in_secs, at) {
        (_, Some(at)) => {
            let t = chrono::DateTime::parse_from_rfc3339(at)
                .with_context(|| format!("invalid --at time '{at}'"))?;
            Ok(t.timestamp_millis())
        }
        (Some(secs), None) => {
            let delta = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX);
            Ok(chrono::Utc::now().timestamp_millis().saturating_add(delta))
        }
        (None, None) => anyhow::bail!("either --in or --at is required"),
    }
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "chime=debug,chime_core=debug,chime_store=debug,chime_scheduler=debug"
    } else {
        "chime=info,chime_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        ChimeConfig::load_from(std::path::Path::new(path))?
    } else {
        ChimeConfig::load()?
    };
    tracing::debug!("Config: store={} retention={}ms", config.store.backend, config.scheduler.retention_window_ms);

    if let Commands::Init = cli.command {
        let path = ChimeConfig::default_path();
        if path.exists() {
            println!("✅ Config already exists: {}", path.display());
        } else {
            ChimeConfig::default().save()?;
            println!("✅ Config saved to: {}", path.display());
        }
        return Ok(());
    }

    let store = chime_store::create_store(&config.store)?;

    match cli.command {
        Commands::Schedule { in_secs, at, body, id, priority, params } => {
            let when = trigger_time_ms(in_secs, at.as_deref())?;
            let mut notification = Notification::new(body, id).with_priority(priority);
            notification.params.extend(params);

            let (wakeup, fired) = TokioWakeupService::new(Arc::new(chime_core::SystemClock));
            let (presenter, mut presented) = ChannelPresenter::new();
            let scheduler = Arc::new(NotificationScheduler::new(
                store,
                Arc::new(wakeup),
                Arc::new(presenter),
                &config.scheduler,
            ));
            scheduler.recover().await?;

            let intent = scheduler.schedule(when, notification).await?;
            println!("📅 Scheduled intent {intent} for {}", format_ms(when));
            println!("   Waiting for it to fire. Press Ctrl+C to stop (the entry stays persisted).");

            let runner = Arc::clone(&scheduler);
            tokio::spawn(async move { runner.run(fired).await });

            tokio::select! {
                shown = presented.recv() => {
                    if let Some(n) = shown {
                        println!("🔔 [{}] {}", n.notification_id, n.body);
                        for (k, v) in &n.params {
                            println!("   {k} = {v}");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("\n👋 Stopped before firing.");
                }
            }
        }

        Commands::Cancel { id } => {
            let scheduler = offline_scheduler(store, &config);
            let n = scheduler.cancel_by_id(id).await?;
            println!("🗑️ Cancelled {n} entr(ies) for notification {id}");
        }

        Commands::CancelAll => {
            let scheduler = offline_scheduler(store, &config);
            let n = scheduler.cancel_all().await?;
            println!("🗑️ Cancelled {n} entr(ies)");
        }

        Commands::List { json } => {
            let scheduler = offline_scheduler(store, &config);
            let pending = scheduler.pending().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pending)?);
            } else if pending.is_empty() {
                println!("(no pending notifications)");
            } else {
                println!("{:<8} {:<14} TRIGGER", "INTENT", "NOTIFICATION");
                for e in pending {
                    println!("{:<8} {:<14} {}", e.intent_id, e.notification_id, format_ms(e.trigger_time_ms));
                }
            }
        }

        Commands::Recover => {
            let scheduler = offline_scheduler(store, &config);
            let n = scheduler.recover().await?;
            println!("🩹 Repaired {n} half-written entr(ies)");
        }

        Commands::Info => {
            let scheduler = offline_scheduler(store.clone(), &config);
            let pending = scheduler.pending().await?;
            println!("🔔 Chime v{}\n", env!("CARGO_PKG_VERSION"));
            println!("  Config:     {}", cli.config.unwrap_or_else(|| ChimeConfig::default_path().display().to_string()));
            println!("  Store:      {} ({})", store.name(), config.store.resolved_path().display());
            println!("  Retention:  {}s", scheduler.retention_window_ms() / 1000);
            println!("  Pending:    {}", pending.len());
        }

        Commands::Init => {}
    }

    Ok(())
}

/// Scheduler for commands that only touch durable state. Wake-up
/// registrations from earlier processes are gone, so cancels are no-ops
/// on the timer side and only clean the tables. Nothing fires here, so
/// the presenter's receiver is dropped straight away.
fn offline_scheduler(
    store: Arc<dyn chime_core::traits::DurableMapStore>,
    config: &ChimeConfig,
) -> NotificationScheduler {
    let (wakeup, _fired) = TokioWakeupService::new(Arc::new(chime_core::SystemClock));
    let (presenter, _presented) = ChannelPresenter::new();
    NotificationScheduler::new(store, Arc::new(wakeup), Arc::new(presenter), &config.scheduler)
}
