//! Bazaar CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar migrate
//!
//! # Create an account (password from BAZAAR_NEW_USER_PASSWORD)
//! bazaar user create -u thandi -e thandi@example.com -r vendor
//!
//! # Delete expired reset tokens and carts
//! bazaar tokens purge
//! bazaar carts purge
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage password reset tokens
    Tokens {
        #[command(subcommand)]
        action: PurgeAction,
    },
    /// Manage persisted carts
    Carts {
        #[command(subcommand)]
        action: PurgeAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Account role (`vendor` or `buyer`)
        #[arg(short, long, default_value = "buyer")]
        role: String,
    },
}

#[derive(Subcommand)]
enum PurgeAction {
    /// Delete expired rows
    Purge,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                role,
            } => {
                commands::user::create(&username, &email, &role).await?;
            }
        },
        Commands::Tokens {
            action: PurgeAction::Purge,
        } => {
            commands::housekeeping::purge_tokens().await?;
        }
        Commands::Carts {
            action: PurgeAction::Purge,
        } => {
            commands::housekeeping::purge_carts().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "bazaar", "user", "create", "-u", "thandi", "-e", "t@example.com", "-r", "vendor",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { ref role, .. }
            }) if role == "vendor"
        ));
    }

    #[test]
    fn test_parse_purge_commands() {
        assert!(Cli::try_parse_from(["bazaar", "tokens", "purge"]).is_ok());
        assert!(Cli::try_parse_from(["bazaar", "carts", "purge"]).is_ok());
        assert!(Cli::try_parse_from(["bazaar", "carts"]).is_err());
    }
}
