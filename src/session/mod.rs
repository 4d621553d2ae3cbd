use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cookie that carries the session credential for browser traffic
pub const SESSION_COOKIE: &str = "sovoli_session";

/// JWT claim set issued on login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub name: String,
    pub roles: Vec<String>,
    pub tenants: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        username: String,
        name: String,
        roles: Vec<String>,
        tenants: Vec<String>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + ChronoDuration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            username,
            name,
            roles,
            tenants,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// User record carried by a resolved session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub roles: Vec<String>,
}

/// Proof of authenticated identity attached to a request for its duration.
/// Never mutated by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub tenants: Vec<String>,
}

impl Session {
    pub fn belongs_to(&self, tenant: &str) -> bool {
        self.tenants.iter().any(|t| t == tenant)
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user: SessionUser {
                id: claims.sub,
                username: claims.username,
                display_name: claims.name,
                roles: claims.roles,
            },
            tenants: claims.tenants,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid credential: {0}")]
    Invalid(String),
    #[error("credential issuer unavailable: {0}")]
    Unavailable(String),
}

/// External credential issuer capability. The production issuer validates
/// locally-signed JWTs; tests substitute their own implementations.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<Session, CredentialError>;
}

/// Issuer backed by HS256 JWTs
pub struct JwtIssuer {
    secret: String,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl CredentialIssuer for JwtIssuer {
    async fn resolve(&self, credential: &str) -> Result<Session, CredentialError> {
        if self.secret.is_empty() {
            return Err(CredentialError::Unavailable(
                "JWT secret not configured".to_string(),
            ));
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(credential, &decoding_key, &validation)
            .map_err(|e| CredentialError::Invalid(e.to_string()))?;

        Ok(Session::from(token_data.claims))
    }
}

/// Sign a claim set into a session token
pub fn generate_token(claims: &Claims, secret: &str) -> Result<String, CredentialError> {
    if secret.is_empty() {
        return Err(CredentialError::Unavailable(
            "JWT secret not configured".to_string(),
        ));
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| CredentialError::Invalid(e.to_string()))
}

/// Resolves the caller's session from request headers.
///
/// Issuer failures and timeouts surface as `None` so that public routes
/// keep working when the issuer is unreachable.
#[derive(Clone)]
pub struct SessionResolver {
    issuer: Arc<dyn CredentialIssuer>,
    timeout: Duration,
}

impl SessionResolver {
    pub fn new(issuer: Arc<dyn CredentialIssuer>, timeout: Duration) -> Self {
        Self { issuer, timeout }
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Session> {
        let credential = extract_credential(headers)?;

        match tokio::time::timeout(self.timeout, self.issuer.resolve(&credential)).await {
            Ok(Ok(session)) => Some(session),
            Ok(Err(e)) => {
                tracing::debug!("session credential rejected: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "credential issuer did not answer within {:?}, treating request as anonymous",
                    self.timeout
                );
                None
            }
        }
    }
}

/// Extract the session credential from the Authorization header or, failing
/// that, the session cookie. One credential per request: a present but
/// malformed bearer header does not fall back to the cookie.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization") {
        let auth_str = auth_header.to_str().ok()?;
        let token = auth_str.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        return Some(token.to_string());
    }

    let cookies = headers.get("cookie")?.to_str().ok()?;
    for pair in cookies.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn claims() -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "ada".to_string(),
            "Ada Lovelace".to_string(),
            vec!["member".to_string()],
            vec!["acme".to_string()],
            1,
        )
    }

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn credential_from_bearer_header() {
        let headers = headers_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_credential(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn credential_from_session_cookie() {
        let headers = headers_with("cookie", "theme=dark; sovoli_session=tok123; lang=en");
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn malformed_bearer_does_not_fall_back_to_cookie() {
        let mut headers = headers_with("authorization", "Basic dXNlcjpwYXNz");
        headers.insert("cookie", HeaderValue::from_static("sovoli_session=tok123"));
        assert_eq!(extract_credential(&headers), None);
    }

    #[tokio::test]
    async fn jwt_issuer_round_trip() {
        let secret = "unit-test-secret";
        let claims = claims();
        let token = generate_token(&claims, secret).unwrap();

        let issuer = JwtIssuer::new(secret);
        let session = issuer.resolve(&token).await.unwrap();
        assert_eq!(session.user.username, "ada");
        assert!(session.belongs_to("acme"));
        assert!(!session.belongs_to("globex"));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let token = generate_token(&claims(), "secret-a").unwrap();
        let issuer = JwtIssuer::new("secret-b");
        assert!(matches!(
            issuer.resolve(&token).await,
            Err(CredentialError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn resolver_maps_issuer_timeout_to_anonymous() {
        struct StalledIssuer;

        #[async_trait]
        impl CredentialIssuer for StalledIssuer {
            async fn resolve(&self, _credential: &str) -> Result<Session, CredentialError> {
                futures::future::pending().await
            }
        }

        let resolver =
            SessionResolver::new(Arc::new(StalledIssuer), Duration::from_millis(20));
        let headers = headers_with("authorization", "Bearer anything");
        assert!(resolver.resolve(&headers).await.is_none());
    }

    #[tokio::test]
    async fn resolver_without_credential_is_anonymous() {
        let resolver = SessionResolver::new(
            Arc::new(JwtIssuer::new("secret")),
            Duration::from_millis(100),
        );
        assert!(resolver.resolve(&HeaderMap::new()).await.is_none());
    }
}
