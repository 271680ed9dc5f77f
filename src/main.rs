mod cli;
mod config;
mod ffmpeg;
mod preset;
mod runner;
mod startup;
mod template;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::ConfigStore;
use ffmpeg::FfmpegProcess;
use runner::{Outcome, Runner};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tui::{Dialogue, TermDialogue};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut dialogue = TermDialogue::new();
    let store = ConfigStore::locate()?;
    debug!(path = %store.path().display(), "config location");

    let report = startup::run_checks(
        &store,
        cli.hash.as_deref(),
        cli.input_path.as_deref(),
        &mut dialogue,
    )?;
    if !report.passed() {
        dialogue.line("Startup check failed.");
        std::process::exit(1);
    }
    dialogue.line("Startup check passed.\n");

    let cwd = std::env::current_dir().context("no working directory")?;
    let mut executor = FfmpegProcess;
    let mut runner = Runner::new(report.config, &store, cwd, &mut dialogue, &mut executor);
    let outcome = runner.run(cli.mode())?;
    if outcome == Outcome::Aborted {
        debug!("operator declined to execute");
    }
    Ok(())
}
