mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn get_with_token(path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn public_route_allows_anonymous_callers() -> Result<()> {
    let response = common::test_app().oneshot(get("/")).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["ok"], true);
    Ok(())
}

#[tokio::test]
async fn public_route_passes_session_through() -> Result<()> {
    let token = common::token_for("ada", &["acme"]);
    let response = common::test_app()
        .oneshot(get_with_token("/about", &token))
        .await?;

    // Unmatched paths default to public and fall through to the page handler
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["authenticated"], true);
    Ok(())
}

#[tokio::test]
async fn authenticated_route_redirects_anonymous_to_sign_in() -> Result<()> {
    let response = common::test_app().oneshot(get("/dashboard/books")).await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get("location")
        .and_then(|h| h.to_str().ok())
        .expect("redirect carries a location header");
    assert_eq!(location, "/signin?return_to=%2Fdashboard%2Fbooks");
    Ok(())
}

#[tokio::test]
async fn authenticated_route_allows_session_holders() -> Result<()> {
    let token = common::token_for("ada", &[]);
    let response = common::test_app()
        .oneshot(get_with_token("/dashboard/books", &token))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["authenticated"], true);
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted_as_credential() -> Result<()> {
    let token = common::token_for("ada", &[]);
    let request = Request::builder()
        .uri("/dashboard/books")
        .header("cookie", format!("sovoli_session={}", token))
        .body(Body::empty())?;

    let response = common::test_app().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn tenant_route_allows_members() -> Result<()> {
    let token = common::token_for("ada", &["acme"]);
    let response = common::test_app()
        .oneshot(get_with_token("/w/acme/shelves", &token))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["tenant"], "acme");
    Ok(())
}

#[tokio::test]
async fn tenant_route_rejects_members_of_other_tenants() -> Result<()> {
    let token = common::token_for("ada", &["globex"]);
    let response = common::test_app()
        .oneshot(get_with_token("/w/acme/shelves", &token))
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = common::body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["kind"], "FORBIDDEN");
    assert_eq!(body["error"]["message"], "forbidden");
    Ok(())
}

#[tokio::test]
async fn tenant_route_redirects_anonymous_callers() -> Result<()> {
    let response = common::test_app().oneshot(get("/w/acme/shelves")).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn declaration_order_shadows_later_public_literal() -> Result<()> {
    // `/w/:tenant/*` is declared before `/w/public-page`, so the literal is
    // classified tenant-scoped: anonymous callers are redirected, and a
    // session from another tenant is refused.
    let response = common::test_app().oneshot(get("/w/public-page")).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let token = common::token_for("ada", &["acme"]);
    let response = common::test_app()
        .oneshot(get_with_token("/w/public-page", &token))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_treated_as_anonymous() -> Result<()> {
    let response = common::test_app()
        .oneshot(get_with_token("/dashboard/books", "not-a-real-token"))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    Ok(())
}
