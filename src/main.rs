mod app;
mod batch;
mod cli;
mod error;
mod keymap;
mod message;
mod parser;
mod project;
mod scanner;
mod terraform;
mod ui;
mod utils;

use std::{fs::File, process, sync::{Arc, Mutex}};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use message::Message;
use scanner::ProjectScanner;
use terraform::Terraform;

const DEBUG_LOG: &str = "debug.log";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.debug {
        init_logging()?;
    }

    let scanner = ProjectScanner::new(cli.scan_options()?);
    let projects = scanner.scan().await?;

    if cli.list_only {
        return scanner.print_projects(&projects, cli.sort, cli.json);
    }

    let (sender, receiver) = mpsc::unbounded_channel();
    let invoker = Arc::new(Terraform::new(cli.terraform.clone()));
    let mut app = App::new(cli.app_options()?, invoker, sender.clone());
    app.update(Message::Refreshed(projects));

    ui::run(&mut app, sender, receiver).await
}

/// Debug logs go to a file; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let file = File::create(DEBUG_LOG).with_context(|| format!("failed to create {DEBUG_LOG}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "debug logging enabled");
    Ok(())
}
