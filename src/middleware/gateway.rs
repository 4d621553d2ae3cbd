use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::access::{decide, Decision};
use crate::error::ApiError;
use crate::state::AppState;

/// Tenant resolved for the current request, injected for downstream handlers
#[derive(Clone, Debug)]
pub struct TenantContext(pub String);

/// Gateway middleware: resolve the session, classify the path, and apply
/// the access decision. `Allow` injects request extensions and continues;
/// redirects and rejections answer without reaching any handler.
pub async fn gateway_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string());

    let session = state.resolver.resolve(request.headers()).await;
    let classification = state.routes.classify(&path, host.as_deref());

    tracing::debug!(
        %path,
        class = ?classification.class,
        tenant = classification.tenant.as_deref(),
        authenticated = session.is_some(),
        "classified request"
    );

    match decide(&classification, session, &original, &state.sign_in_path) {
        Decision::Allow(session) => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            if let Some(tenant) = classification.tenant {
                request.extensions_mut().insert(TenantContext(tenant));
            }
            next.run(request).await
        }
        Decision::RedirectTo(target) => Redirect::to(&target).into_response(),
        Decision::Reject(reason) => {
            tracing::warn!(%path, "request rejected: {}", reason);
            ApiError::forbidden(reason).into_response()
        }
    }
}
