//! Router assembly: every route sits behind the gateway middleware, and
//! `/api/rpc/{operation}` forwards to the contract dispatcher.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::contract::RequestContext;
use crate::error::ApiError;
use crate::middleware::{gateway_middleware, ApiResponse, ApiResult, TenantContext};
use crate::session::Session;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/rpc/:operation", post(rpc_dispatch))
        // Page routes: the gateway decides, rendering is a collaborator
        .fallback(page_passthrough)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gateway_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - service descriptor
async fn root(State(state): State<Arc<AppState>>) -> ApiResponse<Value> {
    let version = env!("CARGO_PKG_VERSION");

    ApiResponse::success(json!({
        "name": "Sovoli Gateway",
        "version": version,
        "description": "Tenant-aware request gateway and typed operation dispatch",
        "operations": state.contract.operation_ids(),
        "routes": state
            .routes
            .patterns()
            .iter()
            .map(|p| json!({ "pattern": p.raw(), "class": p.class() }))
            .collect::<Vec<_>>(),
    }))
}

/// GET /health - liveness probe
async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// POST /api/rpc/:operation - contract dispatch endpoint
async fn rpc_dispatch(
    State(state): State<Arc<AppState>>,
    Path(operation): Path<String>,
    session: Option<Extension<Session>>,
    tenant: Option<Extension<TenantContext>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let input = match payload {
        Ok(Json(value)) => value,
        // Bodyless calls are fine; operations with input schemas will
        // reject the null themselves
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) => return Err(ApiError::invalid_input(rejection.body_text())),
    };

    let ctx = RequestContext {
        session: session.map(|Extension(session)| session),
        tenant: tenant.map(|Extension(TenantContext(tenant))| tenant),
    };

    let data = state.contract.dispatch(&operation, input, &ctx).await?;
    Ok(ApiResponse::success(data))
}

/// Fallback for page-class routes that passed the gateway. Content
/// rendering lives in the web app; the gateway only reports what it
/// resolved for the request.
async fn page_passthrough(
    uri: Uri,
    session: Option<Extension<Session>>,
    tenant: Option<Extension<TenantContext>>,
) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "path": uri.path(),
        "tenant": tenant.map(|Extension(TenantContext(tenant))| tenant),
        "authenticated": session.is_some(),
    }))
}
