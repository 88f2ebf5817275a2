//! Client-side services: session, authorization and the loan workflow

pub mod catalog;
pub mod events;
pub mod gate;
pub mod hints;
pub mod navigation;
pub mod roles;
pub mod session;
pub mod transactions;

use std::sync::Arc;

use crate::{
    api::{
        auth::HttpAuthGateway, catalog::HttpCatalogApi, loans::HttpTransactionApi, ApiClient,
    },
    config::RolesConfig,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub events: events::EventBus,
    pub session: Arc<session::SessionStore>,
    pub catalog: Arc<catalog::CatalogService>,
    pub transactions: Arc<transactions::TransactionCoordinator>,
}

impl Services {
    /// Wire every service onto one shared HTTP client
    pub fn new(client: ApiClient, hints: Arc<dyn hints::HintStore>, roles: &RolesConfig) -> Self {
        let events = events::EventBus::new();

        let session = Arc::new(session::SessionStore::new(
            Arc::new(HttpAuthGateway::new(client.clone())),
            hints,
            roles::RoleResolver::new(roles),
        ));
        let catalog = Arc::new(catalog::CatalogService::new(
            Arc::new(HttpCatalogApi::new(client.clone())),
            session.clone(),
            events.clone(),
        ));
        let transactions = Arc::new(transactions::TransactionCoordinator::new(
            session.clone(),
            Arc::new(HttpTransactionApi::new(client)),
            catalog.clone(),
            events.clone(),
        ));

        Self {
            events,
            session,
            catalog,
            transactions,
        }
    }
}
