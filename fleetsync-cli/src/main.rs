//! FleetSync CLI - Headless Live Fleet Viewer
//!
//! Polls every configured tracker account, merges their devices into one
//! snapshot and prints it. Trackers added here are persisted to
//! `trackers.json` in the data directory.

#![allow(clippy::print_stdout, reason = "CLI tool outputs to stdout")]

use anyhow::Result;
use clap::Parser;
use fleetsync_core::modules::logger;

mod account_commands;
mod cli;
mod commands;
mod context;

use cli::{AccountCommands, Cli, Commands};
use context::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init(&cli.log_level)?;

    let ctx = AppContext::load(&cli).await?;
    tracing::debug!("Using data directory {}", ctx.data_dir.display());

    match cli.command.unwrap_or(Commands::Watch { json: false }) {
        Commands::Watch { json } => commands::watch(ctx, json).await,
        Commands::Once { json } => commands::once(ctx, json).await,
        Commands::Focus { label, imei, zoom } => commands::focus(ctx, label, imei, zoom).await,
        Commands::Address { entity_id } => commands::address(ctx, &entity_id).await,
        Commands::Account(cmd) => match cmd {
            AccountCommands::List { json } => account_commands::list_accounts(ctx, json).await,
            AccountCommands::Add { imei, password, label, color } => {
                account_commands::add_account(ctx, imei, password, label, color).await
            },
            AccountCommands::Remove { label } => account_commands::remove_account(ctx, &label).await,
        },
        Commands::Config { json, write } => {
            let result = if write { commands::write_config(&ctx) } else { commands::show_config(&ctx, json) };
            ctx.shutdown().await;
            result
        },
    }
}
