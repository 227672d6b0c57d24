//! Headless LifeLight host: runs the reminder scheduler and answers
//! analytics queries against the local record store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use lifelight_rs::core::LifeLight;
use lifelight_rs::{config_options, init_logging, load_config, resolve_user};
use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// Command-line options for the `lifelight` binary.
#[derive(Parser)]
#[command(name = "lifelight", version)]
struct Cli {
    /// Extra lifelight.json5 layers, applied last in the order given
    #[arg(long = "config", global = true)]
    configs: Vec<PathBuf>,
    /// Record store journal path, overriding every config layer
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run maintenance, then deliver reminders until Ctrl-C
    Run {
        /// Profile to schedule for; optional when the store holds one user
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Print summary statistics as JSON
    Stats {
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Print badge progress as JSON
    Badges {
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Print every record belonging to a user as JSON
    Export {
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Purge expired insights and compact the journal
    Maintenance,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let config = load_config(config_options(&cwd, &cli.configs), cli.store.as_deref())?;
    let app = LifeLight::open(&config).inspect_err(|err| {
        error!("failed to initialize LifeLight (err={})", err);
    })?;

    match cli.command {
        Command::Run { user } => run(&app, user).await,
        Command::Stats { user } => {
            let user_id = resolve_user(app.store(), user)?;
            print_json(&app.analytics().user_stats(user_id))
        }
        Command::Badges { user } => {
            let user_id = resolve_user(app.store(), user)?;
            print_json(&app.analytics().badge_progress(user_id))
        }
        Command::Export { user } => {
            let user_id = resolve_user(app.store(), user)?;
            print_json(&app.store().export_user_data(user_id)?)
        }
        Command::Maintenance => print_json(&app.store().perform_maintenance()?),
    }
}

async fn run(app: &LifeLight, user: Option<Uuid>) -> anyhow::Result<()> {
    let user_id = resolve_user(app.store(), user)?;
    let report = app.store().perform_maintenance()?;
    info!(
        "startup maintenance done (expired_insights_removed={})",
        report.expired_insights_removed
    );

    let mut events = app.subscribe();
    let interactions = app.alert_interactions(user_id);
    if !interactions.is_empty() {
        warn!(
            "active medications have known interactions (count={})",
            interactions.len()
        );
    }
    let mut badges = app.analytics().badge_progress(user_id);
    if !app.start_scheduler(user_id)? {
        warn!("reminder scheduler not started; only alerts will be shown");
    }
    info!("lifelight running (user_id={}); press Ctrl-C to stop", user_id);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("shutdown requested");
                break;
            }
            received = events.recv() => match received {
                Ok(event) => {
                    info!("notification (tag={}, title={})", event.tag, event.title);
                    println!("{}", serde_json::to_string(&event)?);
                    badges = app.announce_badges(user_id, &badges);
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("notification listener lagged (missed={})", missed);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    app.shutdown().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
