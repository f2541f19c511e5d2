// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kiosk - queue management for a training center front office.
//!
//! This is the binary entry point: the long-running `serve` command with its
//! station console, plus one-shot commands that act on the stored queue.

mod commands;
mod console;
mod display;
mod runtime;
mod serve;
mod shutdown;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use kiosk_config::KioskConfig;
use kiosk_core::{KioskError, ServiceId, StationId, StationStatus};

use crate::commands::Action;

/// Kiosk - queue management for a training center front office.
#[derive(Parser, Debug)]
#[command(name = "kiosk", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard search path.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the kiosk: announcements, storage mirror, and station console.
    Serve,
    /// Issue a ticket for a service.
    Issue { service: String },
    /// Call the next waiting ticket of a service to a station.
    Call { station: String, service: String },
    /// Mark the ticket a station is serving as served.
    Complete { station: String },
    /// Mark the ticket a station is serving as skipped.
    Skip { station: String },
    /// Manage stations.
    Station {
        #[command(subcommand)]
        action: StationCommands,
    },
    /// Show queues, stations, and who is being served.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum StationCommands {
    /// Open a station for calls.
    Open { station: String },
    /// Close a station; a ticket it holds goes back to the queue.
    Close { station: String },
    /// Register a new station.
    Add {
        id: String,
        name: String,
        /// Service ids this station may call (repeatable). Default: all.
        #[arg(long = "service")]
        services: Vec<String>,
        /// Start the station open.
        #[arg(long)]
        open: bool,
    },
    /// Remove a station that is not serving anyone.
    Remove { station: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate configuration and report problems.
    Check,
}

impl StationCommands {
    fn into_action(self) -> Action {
        match self {
            Self::Open { station } => Action::SetStatus {
                station: StationId::new(station),
                status: StationStatus::Open,
            },
            Self::Close { station } => Action::SetStatus {
                station: StationId::new(station),
                status: StationStatus::Closed,
            },
            Self::Add {
                id,
                name,
                services,
                open,
            } => Action::AddStation {
                id: StationId::new(id),
                name,
                services: services.into_iter().map(ServiceId::new).collect::<BTreeSet<_>>(),
                open,
            },
            Self::Remove { station } => Action::RemoveStation {
                station: StationId::new(station),
            },
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<KioskConfig, Vec<kiosk_config::ConfigError>> {
    match path {
        Some(path) => kiosk_config::load_and_validate_path(path),
        None => kiosk_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            kiosk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("kiosk: use --help for available commands");
        return;
    };

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config {
            action: ConfigCommands::Check,
        } => {
            println!(
                "{} configuration is valid ({} services, {} seed stations)",
                "ok".green(),
                config.services.len(),
                config.stations.len()
            );
            Ok(())
        }
        Commands::Issue { service } => {
            oneshot(
                &config,
                Action::Issue {
                    service: ServiceId::new(service),
                },
                false,
            )
            .await
        }
        Commands::Call { station, service } => {
            oneshot(
                &config,
                Action::Call {
                    station: StationId::new(station),
                    service: ServiceId::new(service),
                },
                false,
            )
            .await
        }
        Commands::Complete { station } => {
            oneshot(
                &config,
                Action::Complete {
                    station: StationId::new(station),
                },
                false,
            )
            .await
        }
        Commands::Skip { station } => {
            oneshot(
                &config,
                Action::Skip {
                    station: StationId::new(station),
                },
                false,
            )
            .await
        }
        Commands::Station { action } => oneshot(&config, action.into_action(), false).await,
        Commands::Status { json } => oneshot(&config, Action::Status, json).await,
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) if e.is_user_facing() => {
            eprintln!("{}", e.to_string().yellow());
            2
        }
        Err(e) => {
            report_error(&e);
            1
        }
    };
    // Exit explicitly: a console thread blocked on stdin must not hold the
    // process open after a signal.
    std::process::exit(code);
}

/// One-shot commands log warnings only, unless `RUST_LOG` says otherwise.
async fn oneshot(config: &KioskConfig, action: Action, json: bool) -> Result<(), KioskError> {
    serve::init_tracing("warn");
    commands::run_oneshot(config, action, json).await
}

fn report_error(e: &KioskError) {
    eprintln!("{}: {e}", "error".red());
}
