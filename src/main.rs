//! toolbuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use toolbuddy::{
    agent::{ChatDriver, EventBus},
    cli::Args,
    config::Config,
    provider::OpenAiClient,
    repl::{input::InputHandler, ReplSession},
    tools::ToolRegistry,
    workspace::Workspace,
};
use tracing::{debug, info};

/// Run the interactive session in the selected working directory
async fn run(args: &Args) -> Result<()> {
    let verbosity = args.verbosity();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(model) = &args.model {
        config.provider.model = model.clone();
    }
    if let Some(base_url) = &args.base_url {
        config.provider.base_url = base_url.clone();
    }
    debug!(?config, "configuration loaded");

    let workspace = Workspace::open(args.working_dir())?;
    info!(dir = %workspace.dir().display(), "working directory ready");

    let client = OpenAiClient::with_config(
        &config.provider.base_url,
        &config.provider.model,
        config.api_key(),
        config.request_timeout(),
    )
    .context("Failed to build provider client")?;

    let (events, receiver) = EventBus::new();

    let mut driver = ChatDriver::new(
        Arc::new(client),
        ToolRegistry::new(),
        config.tool_context(workspace.dir().to_path_buf()),
    )
    .with_instructions(workspace.instructions()?)
    .with_config(config.driver_config())
    .with_estimator(config.throttle.estimator.build())
    .with_retry(config.retry_policy())
    .with_events(events);

    let input = InputHandler::with_default_history()?;
    let mut repl = ReplSession::new(input, verbosity, receiver);
    repl.show_welcome(env!("CARGO_PKG_VERSION"), &driver, workspace.dir());

    repl.run(&mut driver, workspace.prompt()?).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.verbosity().log_filter())),
        )
        .init();

    if let Err(e) = run(&args).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
