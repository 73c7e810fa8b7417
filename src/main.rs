//! vyos-config - push interface, NAT, DHCP and DNS settings to a VyOS router
//!
//! Anything not given as a flag is asked for interactively, then every
//! requested configuration set is committed over a single SSH session.

mod cli;
mod commands;
mod config;
mod dispatch;
mod models;
mod prompt;
mod session;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::TargetConfig;
use prompt::{IoPrompter, Prompter};
use session::{Connector, SshConnector};

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries prompts and confirmations
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vyos_config=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut target = TargetConfig::load();
    if cli.save {
        target.save = true;
    }

    let mut prompter = IoPrompter::console();
    let mut out = io::stdout();
    if run(&cli, &target, &mut prompter, &SshConnector, &mut out)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Collect, format, send, disconnect. Input problems are returned as errors;
/// anything that goes wrong talking to the router is reported on `out` and
/// yields `Ok(false)`.
fn run(
    cli: &Cli,
    target: &TargetConfig,
    prompter: &mut dyn Prompter,
    connector: &dyn Connector,
    out: &mut dyn Write,
) -> Result<bool> {
    let request = prompt::collect_request(cli, prompter)
        .context("Failed to read configuration choices")?;
    let sets = commands::plan(&request)?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        let plan = serde_json::to_string(&sets).unwrap_or_default();
        tracing::debug!(%plan, "Planned configuration sets");
    }

    if cli.dry_run {
        dispatch::print_plan(&sets, out)?;
        return Ok(true);
    }

    if request.is_empty() {
        tracing::info!("No configuration requested; connecting anyway to verify access");
    }

    match dispatch::apply(&sets, connector, target, out) {
        Ok(applied) => {
            tracing::info!("Applied {} configuration set(s)", applied.len());
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "An error occurred: {}", e)?;
            tracing::debug!("{:#}", anyhow::Error::from(e));
            Ok(false)
        }
    }
}
