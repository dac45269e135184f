//! Emporium CLI - database migrations, seeding and dev tokens.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! emporium migrate
//!
//! # Insert or refresh the predefined roles
//! emporium seed roles
//!
//! # Create a category hierarchy from YAML (or preview it)
//! emporium seed categories categories.yaml --dry-run
//!
//! # Sign an access token for local testing
//! emporium token --user-id 1 --name "Grace" --grant all
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed roles or categories
//! - `token` - Issue a development access token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Issue a development access token
    Token {
        /// User ID placed in the `sub` claim
        #[arg(short, long)]
        user_id: i32,

        /// Display name (used as the review author name)
        #[arg(short, long)]
        name: String,

        /// Role name, informational only
        #[arg(short, long, default_value = "")]
        role: String,

        /// Permission grant, e.g. `products:*` or `all` (repeatable)
        #[arg(short, long = "grant")]
        grants: Vec<String>,

        /// Lifetime in minutes
        #[arg(long, default_value_t = 60)]
        minutes: i64,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert or refresh the predefined roles
    Roles,
    /// Create categories from a YAML file
    Categories {
        /// Path to the YAML file
        file: String,

        /// Build the tree in memory and report, without writing
        #[arg(long)]
        dry_run: bool,
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
        Commands::Seed { target } => match target {
            SeedTarget::Roles => commands::seed::roles().await?,
            SeedTarget::Categories { file, dry_run } => {
                commands::seed::categories(&file, dry_run).await?;
            }
        },
        Commands::Token {
            user_id,
            name,
            role,
            grants,
            minutes,
        } => commands::token::issue(user_id, &name, &role, &grants, minutes)?,
    }
    Ok(())
}
