use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::contract::{ops, Contract};
use crate::routing::RouteTable;
use crate::session::{CredentialIssuer, JwtIssuer, SessionResolver};

/// Read-only per-process state shared by every request. Route and contract
/// tables are built once at startup and never mutated.
pub struct AppState {
    pub routes: RouteTable,
    pub contract: Contract,
    pub resolver: SessionResolver,
    pub sign_in_path: String,
}

impl AppState {
    pub fn new(
        routes: RouteTable,
        contract: Contract,
        resolver: SessionResolver,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            routes,
            contract,
            resolver,
            sign_in_path: sign_in_path.into(),
        }
    }

    /// Assemble production state from configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let routes = RouteTable::from_entries(&config.gateway.routes)?;
        let contract = ops::default_contract()?;

        let issuer: Arc<dyn CredentialIssuer> =
            Arc::new(JwtIssuer::new(config.security.jwt_secret.clone()));
        let resolver = SessionResolver::new(
            issuer,
            Duration::from_millis(config.security.session_resolve_timeout_ms),
        );

        Ok(Self::new(
            routes,
            contract,
            resolver,
            config.security.sign_in_path.clone(),
        ))
    }
}
