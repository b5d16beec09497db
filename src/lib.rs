//! PartyFund: crowdfunded parties at bars.
//!
//! Users sign up (or link Twitter/Google), create events at venues and RSVP
//! to each other's events. Sessions carry identity; an admin surface sits
//! behind two gates.

use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

pub use routes::create_routes;

use config::Config;
use middleware::SessionRecords;
use services::{AuthService, OAuthService, TokenExchange};
use store::Store;
use utils::{AppError, CredentialHasher};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub oauth: OAuthService,
    pub sessions: SessionRecords,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        exchange: Arc<dyn TokenExchange>,
    ) -> Result<Self, AppError> {
        let hasher = CredentialHasher::new(&config.hashing)?;

        Ok(Self {
            auth: AuthService::new(store.clone(), hasher, config.admin_role.clone()),
            oauth: OAuthService::new(&config.oauth, store.clone(), exchange),
            sessions: SessionRecords::new(),
            store,
            config: Arc::new(config),
        })
    }
}
