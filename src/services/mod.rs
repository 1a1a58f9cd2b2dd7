pub mod analytics_service;
pub mod import_service;

pub use analytics_service::*;
pub use import_service::*;
