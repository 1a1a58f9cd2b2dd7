use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use salescope::database::connection::{
    establish_connection, get_database_url, setup_database, DEFAULT_DATABASE_URL,
};
use salescope::ingest::read_rows;
use salescope::server::{self, app::AppSettings, app::DEFAULT_MAX_UPLOAD_BYTES};
use salescope::services::ImportService;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[clap(short, long, env = "PORT", default_value = "5000")]
        port: u16,
        #[clap(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
        #[clap(long, env = "CORS_ORIGIN")]
        cors_origin: Option<String>,
        #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
        /// Directory with a pre-built front-end to serve for unmatched paths
        #[clap(long)]
        static_dir: Option<PathBuf>,
    },
    Migrate {
        #[clap(subcommand)]
        direction: server::MigrateDirection,
        #[clap(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
    /// Load a spreadsheet into the database without going through HTTP
    Import {
        file: PathBuf,
        #[clap(short, long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
    /// Show the columns and first row the importer would see
    Inspect { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Serve {
            port,
            database_url,
            cors_origin,
            max_upload_bytes,
            static_dir,
        } => {
            info!("Starting server on port {}", port);
            let settings = AppSettings {
                max_upload_bytes,
                static_dir,
            };
            server::start_server(port, &database_url, cors_origin.as_deref(), settings).await?;
        }
        Commands::Migrate {
            direction,
            database_url,
        } => {
            server::migrate_database(&database_url, direction).await?;
        }
        Commands::Import { file, database_url } => {
            let (file_name, bytes) = read_file(&file)?;
            let db = establish_connection(&get_database_url(Some(database_url.as_str()))).await?;
            setup_database(&db).await?;

            let summary = ImportService::new(db).import_file(&file_name, &bytes).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Inspect { file } => {
            let (file_name, bytes) = read_file(&file)?;
            let rows = read_rows(&file_name, &bytes)?;
            info!("{} data rows in '{}'", rows.len(), file_name);

            match rows.first() {
                Some(row) => {
                    let columns: Vec<&String> = row.keys().collect();
                    println!("columns: {:?}", columns);
                    println!("{}", serde_json::to_string_pretty(row)?);
                }
                None => println!("no data rows"),
            }
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((file_name, bytes))
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
