//! Ambassador Ranking CLI - Database migrations and administrator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run migrations (including the legacy schema upgrade)
//! ranking-cli migrate
//!
//! # Create an administrator (password read from stdin)
//! ranking-cli admin create -u maria -e maria@example.com -n "Maria Souza"
//!
//! # Reset an administrator's password (password read from stdin)
//! ranking-cli admin set-password -u admin
//! ```
//!
//! The database is taken from `RANKING_DATABASE_URL` (fallback
//! `DATABASE_URL`), the same as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ranking-cli")]
#[command(author, version, about = "Ambassador Ranking CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and upgrade a legacy schema
    Migrate,
    /// Manage administrators
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Replace an administrator's password
    SetPassword {
        /// Login name
        #[arg(short, long, default_value = "admin")]
        username: String,
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
            AdminAction::Create {
                username,
                email,
                name,
            } => {
                commands::admin::create_administrator(&username, &email, &name).await?;
            }
            AdminAction::SetPassword { username } => {
                commands::admin::set_password(&username).await?;
            }
        },
    }
    Ok(())
}
