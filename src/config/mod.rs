use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::routing::{AccessClass, RouteEntry, TenantRule};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Upper bound on the credential issuer call; timeout means anonymous
    pub session_resolve_timeout_ms: u64,
    pub sign_in_path: String,
}

/// The route table as configuration data. Order is significant: the
/// classifier takes the first structural match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub routes: Vec<RouteEntry>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SOVOLI_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }
        if let Ok(v) = env::var("SERVER_CORS_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_RESOLVE_TIMEOUT_MS") {
            self.security.session_resolve_timeout_ms = v
                .parse()
                .unwrap_or(self.security.session_resolve_timeout_ms);
        }
        if let Ok(v) = env::var("SECURITY_SIGN_IN_PATH") {
            self.security.sign_in_path = v;
        }

        self
    }

    /// Default Sovoli route table. Access classes and tenant extraction are
    /// deployment configuration; this is the shape the web app ships with.
    fn default_routes() -> Vec<RouteEntry> {
        vec![
            RouteEntry::new("/", AccessClass::Public),
            RouteEntry::new("/health", AccessClass::Public),
            RouteEntry::new("/signin", AccessClass::Public),
            // Per-operation requirements are enforced by the contract layer
            RouteEntry::new("/api/*", AccessClass::Public),
            RouteEntry::new("/dashboard/*", AccessClass::Authenticated),
            RouteEntry::new("/settings/*", AccessClass::Authenticated),
            // Workspace routes are scoped to the tenant named in the path
            RouteEntry::new("/w/:tenant/*", AccessClass::TenantScoped)
                .with_tenant_from(TenantRule::PathSegment(1)),
        ]
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                session_resolve_timeout_ms: 2000,
                sign_in_path: "/signin".to_string(),
            },
            gateway: GatewayConfig {
                routes: Self::default_routes(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec!["https://staging.sovoli.com".to_string()],
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from the environment
                jwt_expiry_hours: 24,
                session_resolve_timeout_ms: 1000,
                sign_in_path: "/signin".to_string(),
            },
            gateway: GatewayConfig {
                routes: Self::default_routes(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                enable_cors: true,
                cors_origins: vec!["https://sovoli.com".to_string()],
            },
            security: SecurityConfig {
                jwt_secret: String::new(), // must come from the environment
                jwt_expiry_hours: 4,
                session_resolve_timeout_ms: 500,
                sign_in_path: "/signin".to_string(),
            },
            gateway: GatewayConfig {
                routes: Self::default_routes(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
