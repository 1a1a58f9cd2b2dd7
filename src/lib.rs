pub mod analytics;
pub mod database;
pub mod errors;
pub mod ingest;
pub mod server;
pub mod services;
