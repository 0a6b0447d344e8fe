//! Cadastro CLI - operator commands
//!
//! Usage:
//!   cadastro migrate [--seed]
//!   cadastro create-user <usuario> <senha>

use anyhow::Context;
use cadastro_api::auth::hash_password;
use cadastro_core::config::AppConfig;
use cadastro_core::models::UserPayload;
use cadastro_core::{schema, CredentialStore, PgStore, StoreError};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "cadastro")]
#[command(about = "Cadastro registry administration")]
#[command(version)]
struct Cli {
    /// PostgreSQL URL (overrides DATABASE_URL and the config file)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables and indexes
    Migrate {
        /// Also insert demo clients and products
        #[arg(long)]
        seed: bool,
    },
    /// Create a login account
    CreateUser {
        usuario: String,
        senha: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadastro_core=info,cadastro=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let store = PgStore::connect(&config.database).await?;

    match cli.command {
        Commands::Migrate { seed } => {
            store.migrate().await?;
            if seed {
                schema::seed(store.pool()).await?;
            }
            println!("Migrations applied{}", if seed { " (with demo data)" } else { "" });
        }
        Commands::CreateUser { usuario, senha } => {
            let user = UserPayload {
                usuario: Some(usuario),
                senha: Some(senha),
            }
            .validate()?;

            let hash = hash_password(&user.senha).context("Failed to hash password")?;
            match store.create(&user.usuario, &hash).await {
                Ok(created) => {
                    info!(user_id = created.id, usuario = %created.usuario, "User created");
                    println!("Created user {} (id {})", created.usuario, created.id);
                }
                Err(StoreError::Conflict(msg)) => anyhow::bail!(msg),
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
