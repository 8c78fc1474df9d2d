//! Rifa CLI — operator tooling for the raffle settlement engine.
//!
//! Subcommands: init, create, sell, approve, cancel, close, draw, status,
//! watch.

mod commands;

use clap::{Parser, Subcommand};

/// Rifa — raffle ticket inventory and settlement engine.
#[derive(Parser, Debug)]
#[command(name = "rifa", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "rifa.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Create a raffle and initialize its ticket pool.
    Create(commands::create::CreateArgs),
    /// Start a purchase: reserve tickets and create a pending payment.
    Sell(commands::sell::SellArgs),
    /// Record gateway approval for a payment and settle the sale.
    Approve(commands::approve::ApproveArgs),
    /// Cancel an open purchase.
    Cancel(commands::cancel::CancelArgs),
    /// Close a raffle's sales.
    Close(commands::close::CloseArgs),
    /// Schedule and execute a draw for a closed raffle.
    Draw(commands::draw::DrawArgs),
    /// Show raffles, counts, and payment totals.
    Status(commands::status::StatusArgs),
    /// Run the reservation-expiry sweeper until interrupted.
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(&cli.config, args),
        Commands::Create(args) => commands::create::run(&cli.config, args),
        Commands::Sell(args) => commands::sell::run(&cli.config, args),
        Commands::Approve(args) => commands::approve::run(&cli.config, args),
        Commands::Cancel(args) => commands::cancel::run(&cli.config, args),
        Commands::Close(args) => commands::close::run(&cli.config, args),
        Commands::Draw(args) => commands::draw::run(&cli.config, args),
        Commands::Status(args) => commands::status::run(&cli.config, args),
        Commands::Watch(args) => commands::watch::run(&cli.config, args).await,
    }
}
