use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use super::migrations::Migrator;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://salescope.db?mode=rwc";

/// Open the process-wide connection pool.
///
/// The returned handle is cheap to clone and is shared by every request
/// handler; it is never torn down explicitly.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Normalise a user supplied database location into a connection URL.
///
/// Bare file paths are treated as SQLite databases and created on demand.
pub fn get_database_url(database: Option<&str>) -> String {
    match database {
        None => DEFAULT_DATABASE_URL.to_string(),
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(url) if url.contains("://") || url.starts_with("sqlite:") => url.to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
    }
}

/// Bring the schema up to date.
pub async fn setup_database(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}
