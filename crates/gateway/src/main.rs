//! User API - HTTP entry point for the user service.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::DatabaseConfig;
use gateway_lib::config::GatewayConfig;
use gateway_lib::MigrateAction;

#[derive(Parser)]
#[command(name = "user-api")]
#[command(about = "User management REST API")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        #[arg(long, env = "SERVER_HOST")]
        host: Option<String>,
        #[arg(long, env = "SERVER_PORT")]
        port: Option<u16>,
    },
    /// Manage database migrations
    Migrate {
        #[arg(value_enum, default_value_t = MigrateCommand::Up)]
        action: MigrateCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MigrateCommand {
    /// Apply pending migrations
    Up,
    /// Roll back the last migration
    Down,
    /// Show applied and pending migrations
    Status,
    /// Drop everything and re-apply
    Fresh,
}

impl From<MigrateCommand> for MigrateAction {
    fn from(cmd: MigrateCommand) -> Self {
        match cmd {
            MigrateCommand::Up => MigrateAction::Up,
            MigrateCommand::Down => MigrateAction::Down,
            MigrateCommand::Status => MigrateAction::Status,
            MigrateCommand::Fresh => MigrateAction::Fresh,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { host, port } => {
            let mut config = GatewayConfig::from_env()?;
            tracing::debug!(?config, "Configuration loaded");

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            gateway_lib::run_server(config).await
        }
        Commands::Migrate { action } => {
            let database = DatabaseConfig::from_env()?;
            gateway_lib::run_migrations(&database, action.into()).await
        }
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,tower_http=debug".into())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}
