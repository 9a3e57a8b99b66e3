//! Lectern Library Management Server
//!
//! REST JSON API for a small library: catalog, borrow requests with admin
//! approval, overdue fines, shelves, members, reports and a reading assistant.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire repository and services over an existing pool
    pub fn new(config: AppConfig, pool: sqlx::PgPool) -> AppResult<Self> {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(
            repository,
            config.auth.clone(),
            config.borrowing.clone(),
            config.fines.clone(),
            config.assistant.clone(),
        )?;

        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
