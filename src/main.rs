use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use individual::config::RegistryConfig;
use individual::database::connection::{establish_connection, get_database_url, setup_database};
use individual::server;
use individual::services::AuthorizationService;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// YAML configuration file.
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long)]
        database: Option<String>,
    },
    /// Create a user with the given rights and print a session id for it.
    SeedUser {
        #[clap(short, long)]
        username: String,
        /// Comma separated right codes, e.g. 159001,180001
        #[clap(short, long, value_delimiter = ',')]
        rights: Vec<String>,
        #[clap(long, default_value = "24")]
        ttl_hours: i64,
        #[clap(short, long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let mut config = RegistryConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve {
            port,
            database,
            cors_origin,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(database) = database {
                config.server.database = database;
            }
            if cors_origin.is_some() {
                config.server.cors_origin = cors_origin;
            }
            info!("Starting server on port {}", config.server.port);
            server::start_server(config).await?;
        }
        Commands::Migrate {
            direction,
            database,
        } => {
            let database = database.unwrap_or(config.server.database);
            info!("Running database migration: {:?}", direction);
            server::migrate_database(&database, direction).await?;
        }
        Commands::SeedUser {
            username,
            rights,
            ttl_hours,
            database,
        } => {
            let database = database.unwrap_or(config.server.database);
            let db = establish_connection(&get_database_url(Some(&database))).await?;
            setup_database(&db).await?;

            let (user, session_id) = AuthorizationService::new(db)
                .create_user_with_session(&username, &rights, chrono::Duration::hours(ttl_hours))
                .await?;
            info!(user_id = user.id, "Seeded user '{}'", user.username);
            println!("{}", session_id);
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sqlx=warn,{}", log_level)))
        .without_time()
        .init();
}
