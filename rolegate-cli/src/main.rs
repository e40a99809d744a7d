//! Rolegate CLI: drive the portal's sign-in and routing from a terminal.
//!
//! ```bash
//! rolegate serve-roles --table roles.json &
//! rolegate callback "http://localhost/auth/callback?success=1&access_token=...&user=..."
//! rolegate visit /dashboard
//! rolegate logout
//! ```
//!
//! See `rolegate --help` for all available commands and options.

mod commands;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use commands::PrintNavigator;
use rolegate_core::config::RolegateConfig;
use rolegate_core::logging::{self, LogLevel};
use rolegate_core::portal::Portal;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "rolegate",
    about = "OAuth callback ingestion and role-gated routing for a multi-role portal",
    version
)]
struct Cli {
    /// Config file (default: ./rolegate.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an identity-provider callback URL
    Callback {
        /// Full callback URL or path with its query string
        url: String,
    },
    /// Enter a route and print what the guard decides
    Visit {
        /// Path such as /dashboard or /admin/users
        path: String,
    },
    /// Clear the local session
    Logout,
    /// Show the local session
    Session,
    /// Print the role → namespace table
    Routes,
    /// Serve a development role-lookup endpoint
    ServeRoles {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8081")]
        bind: String,

        /// JSON object mapping bearer tokens to role strings
        #[arg(long)]
        table: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<RolegateConfig> {
    let mut config = match &cli.config {
        Some(path) if !path.exists() => bail!("config file {} does not exist", path.display()),
        Some(path) => RolegateConfig::load_from(path)?,
        None => RolegateConfig::load()?,
    };

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    logging::init_logging(&config.logging)?;
    log::debug!("Session store at {}", config.session.store_path.display());

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let mut out = io::stdout();

    runtime.block_on(async {
        match cli.command {
            Commands::Callback { url } => {
                commands::callback::run(&open_portal(&config)?, &url, &mut out).await
            }
            Commands::Visit { path } => {
                commands::visit::run(&open_portal(&config)?, &path, &mut out).await
            }
            Commands::Logout => commands::session::logout(&open_portal(&config)?, &mut out).await,
            Commands::Session => commands::session::show(&open_portal(&config)?, &mut out).await,
            Commands::Routes => commands::routes::run(&config.route_map()?, &mut out),
            Commands::ServeRoles { bind, table } => commands::serve::run(&bind, &table).await,
        }
    })
}

fn open_portal(config: &RolegateConfig) -> Result<Portal> {
    Portal::open(config, Arc::new(PrintNavigator))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        log::debug!("Command failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
