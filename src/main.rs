use aimtrack::auth::{CredentialStore, Whitelist};
use aimtrack::config::Config;
use aimtrack::{gateway, store};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aimtrack", version, about = "Daily aim-training tracker")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "aimtrack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve,
    /// Initialize or reset a player's credential directly against the store,
    /// without going through HTTP. Same whitelist and validation rules.
    InitPlayer { pseudo: String, password: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => gateway::run(&config).await,
        Command::InitPlayer { pseudo, password } => init_player(&config, &pseudo, &password).await,
    }
}

async fn init_player(config: &Config, pseudo: &str, password: &str) -> Result<()> {
    let whitelist = Whitelist::load(&config.auth.whitelist_path)?;
    if !whitelist.is_allowed(pseudo) {
        bail!("Pseudo '{pseudo}' is not in the whitelist");
    }

    let store = Arc::from(store::create_store(&config.store)?);
    let credentials = CredentialStore::new(store);
    credentials.initialize(pseudo, password).await?;

    println!("Credential initialized for '{pseudo}'.");
    Ok(())
}
