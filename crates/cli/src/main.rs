//! Food Order CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run schema and session store migrations
//! fo-cli migrate
//!
//! # Give an existing account access to admin mode
//! fo-cli admin promote -e owner@example.com
//!
//! # Load the demo menu into an empty database
//! fo-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fo-cli")]
#[command(author, version, about = "Food Order CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert the demo menu if no products exist yet
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Move an existing user into the admin group
    Promote {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
    /// Move an admin back into the customer group
    Demote {
        /// Email address of the account
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
            AdminAction::Demote { email } => commands::admin::demote(&email).await?,
        },
        Commands::Seed => commands::seed::menu().await?,
    }
    Ok(())
}
