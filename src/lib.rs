//! Library client
//!
//! Session, authorization and loan/reservation workflow for a library
//! management backend. The crate resolves who the user is, derives their
//! roles, gates privileged actions on them and drives the catalog and
//! transaction endpoints.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Process-wide state shared by every consumer
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Build the HTTP client and services, keeping the identity hint on disk
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let client = api::ApiClient::new(&config.api)?;
        let hints = Arc::new(services::hints::FileHintStore::new(
            config.session.hint_path.clone(),
        ));
        let services = services::Services::new(client, hints, &config.roles);

        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
