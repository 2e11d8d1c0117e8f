//! Library catalog server
//!
//! REST JSON API over a library catalog: books, authors, genres, individually
//! tracked copies and the loans made on them.

use std::sync::Arc;

use sqlx::PgPool;

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
    /// Pool also held by the repositories, used directly for readiness checks
    pub db: PgPool,
}
