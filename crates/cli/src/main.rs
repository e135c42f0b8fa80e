//! Pharmship CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! pharmship migrate
//!
//! # Create a staff user (prints a generated password unless one is given)
//! pharmship user create -e tech@pharmacy.com -n "Sam Tech" -r technician
//!
//! # List staff users
//! pharmship user list
//!
//! # Seed the admin user, medication catalog and sample patients
//! pharmship seed --admin-password "change-me-now"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` / `user list` - Manage staff logins
//! - `seed` - Insert demo data (safe to run repeatedly)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pharmship")]
#[command(author, version, about = "Pharmship CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database with the admin user and sample data
    Seed {
        /// Password for `admin@pharmacy.com` (generated when omitted)
        #[arg(long, env = "PHARMSHIP_ADMIN_PASSWORD")]
        admin_password: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new staff user
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `pharmacist`, `technician`)
        #[arg(short, long, default_value = "technician")]
        role: String,

        /// Password (generated and printed when omitted)
        #[arg(long, env = "PHARMSHIP_USER_PASSWORD")]
        password: Option<String>,
    },
    /// List staff users
    List,
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create(&email, &name, &role, password).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
        Commands::Seed { admin_password } => commands::seed::run(admin_password).await?,
    }
    Ok(())
}
