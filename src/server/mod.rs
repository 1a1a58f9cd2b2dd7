pub mod app;
pub mod error;
pub mod handlers;

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use crate::database::{connection::*, migrations::Migrator};
use anyhow::Result;
use app::AppSettings;
use sea_orm_migration::prelude::*;
use tracing::info;

pub async fn start_server(
    port: u16,
    database_url: &str,
    cors_origin: Option<&str>,
    settings: AppSettings,
) -> Result<()> {
    let database_url = get_database_url(Some(database_url));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    if let Some(dir) = &settings.static_dir {
        info!("Serving static files from {}", dir.display());
    }
    let app = app::create_app(db, cors_origin, settings).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /api/health                 - Health check");
    info!("  /api/upload                 - Spreadsheet upload (multipart 'file')");
    info!("  /api/analytics/*            - Aggregations over the stored sales");
}

pub async fn migrate_database(database_url: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_url));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
