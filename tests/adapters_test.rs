//! Identity provider adapters against local stand-in providers.
//!
//! Each test starts a small Axum server on a loopback port that speaks just
//! enough of the GitHub OAuth or OpenID Connect protocol for one login.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::net::TcpListener;

use orchestra_security::session::{
    GitHubAuthHelper, GitHubConfig, OidcAuthHelper, OidcConfig, ThirdPartyAuthHelper,
};
use orchestra_security::CoreError;

const GOOD_CODE: &str = "good-code";
const ACCESS_TOKEN: &str = "github-test-access-token";

/// Serves `app` on an ephemeral loopback port and returns its base URL
async fn serve(app: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let app = app(base_url.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base_url
}

// ============================================================================
// GitHub
// ============================================================================

async fn github_access_token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    if form.get("code").map(String::as_str) == Some(GOOD_CODE)
        && form.get("client_secret").map(String::as_str) == Some("shh")
    {
        Json(json!({ "access_token": ACCESS_TOKEN, "token_type": "bearer", "scope": "read:org" }))
    } else {
        Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        }))
    }
}

fn github_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {ACCESS_TOKEN}").as_str())
}

async fn github_user(headers: HeaderMap) -> Response {
    if !github_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "login": "tstark", "id": 1, "name": "Tony Stark" })).into_response()
}

async fn github_orgs(headers: HeaderMap) -> Response {
    if !github_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{ "login": "StarkIndustries", "id": 2 }, { "login": "avengers", "id": 3 }]))
        .into_response()
}

async fn github_helper(allowed_organizations: &[&str]) -> GitHubAuthHelper {
    let base_url = serve(|_| {
        Router::new()
            .route("/login/oauth/access_token", post(github_access_token))
            .route("/user", get(github_user))
            .route("/user/orgs", get(github_orgs))
    })
    .await;

    GitHubAuthHelper::new(GitHubConfig {
        client_id: "orchestra".to_string(),
        client_secret: "shh".to_string(),
        allowed_organizations: allowed_organizations.iter().map(|o| o.to_string()).collect(),
        web_base_url: base_url.clone(),
        api_base_url: base_url,
    })
    .unwrap()
}

#[tokio::test]
async fn test_github_login() {
    let helper = github_helper(&[]).await;
    let identity = helper.exchange("state", GOOD_CODE).await.unwrap();
    assert_eq!(identity.id, "tstark");
    assert_eq!(identity.name, "Tony Stark");
}

#[tokio::test]
async fn test_github_org_membership_is_case_insensitive() {
    let helper = github_helper(&["starkindustries"]).await;
    let identity = helper.exchange("state", GOOD_CODE).await.unwrap();
    assert_eq!(identity.id, "tstark");
}

#[tokio::test]
async fn test_github_rejects_outsiders() {
    let helper = github_helper(&["hydra"]).await;
    let err = helper.exchange("state", GOOD_CODE).await.unwrap_err();
    assert!(err.is_authentication(), "{err:?}");
}

#[tokio::test]
async fn test_github_bad_code() {
    let helper = github_helper(&[]).await;
    let err = helper.exchange("state", "stale-code").await.unwrap_err();
    assert!(matches!(err, CoreError::Internal(_)), "{err:?}");
}

// ============================================================================
// OpenID Connect
// ============================================================================

const SECRET: &[u8] = b"orchestra-test-signing-key-012345678";
const SECRET_B64: &str = "b3JjaGVzdHJhLXRlc3Qtc2lnbmluZy1rZXktMDEyMzQ1Njc4";
const CLIENT_ID: &str = "orchestra";

async fn oidc_discovery(State(issuer): State<String>) -> Json<Value> {
    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize"),
        "token_endpoint": format!("{issuer}/token"),
        "jwks_uri": format!("{issuer}/jwks"),
        "response_types_supported": ["code"],
    }))
}

async fn oidc_jwks() -> Json<Value> {
    Json(json!({
        "keys": [{ "kty": "oct", "kid": "k1", "alg": "HS256", "k": SECRET_B64 }]
    }))
}

async fn oidc_token(
    State(issuer): State<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let email_verified = match form.get("code").map(String::as_str) {
        Some(GOOD_CODE) => true,
        Some("unverified-code") => false,
        _ => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })))
                .into_response()
        }
    };

    let claims = json!({
        "iss": issuer,
        "aud": CLIENT_ID,
        "sub": "248289761001",
        "exp": chrono::Utc::now().timestamp() + 3600,
        "email": "pepper@starkindustries.com",
        "email_verified": email_verified,
    });
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some("k1".to_string());
    let id_token =
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap();

    Json(json!({ "access_token": "at", "token_type": "Bearer", "id_token": id_token }))
        .into_response()
}

async fn oidc_provider() -> String {
    serve(|issuer| {
        Router::new()
            .route("/.well-known/openid-configuration", get(oidc_discovery))
            .route("/jwks", get(oidc_jwks))
            .route("/token", post(oidc_token))
            .with_state(issuer)
    })
    .await
}

async fn oidc_helper() -> OidcAuthHelper {
    let provider_url = oidc_provider().await;
    OidcAuthHelper::connect(OidcConfig {
        provider_url,
        client_id: CLIENT_ID.to_string(),
        client_secret: "shh".to_string(),
        redirect_url: "https://orchestra.example.com/auth/callback".to_string(),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_oidc_login() {
    let helper = oidc_helper().await;

    let auth_url = helper.auth_url("xyz");
    assert!(auth_url.contains("/authorize?response_type=code"));
    assert!(auth_url.contains("state=xyz"));

    let identity = helper.exchange("xyz", GOOD_CODE).await.unwrap();
    assert_eq!(identity.id, "pepper@starkindustries.com");
    // No name claim, so the email stands in.
    assert_eq!(identity.name, "pepper@starkindustries.com");
}

#[tokio::test]
async fn test_oidc_unverified_email() {
    let helper = oidc_helper().await;
    let err = helper.exchange("xyz", "unverified-code").await.unwrap_err();
    assert!(err.is_authentication(), "{err:?}");
}

#[tokio::test]
async fn test_oidc_rejected_code() {
    let helper = oidc_helper().await;
    let err = helper.exchange("xyz", "stale-code").await.unwrap_err();
    assert!(matches!(err, CoreError::Internal(_)), "{err:?}");
}

#[tokio::test]
async fn test_oidc_discovery_rejects_foreign_issuer() {
    let provider_url = serve(|_| {
        Router::new()
            .route("/.well-known/openid-configuration", get(oidc_discovery))
            .with_state("https://evil.example.com".to_string())
    })
    .await;

    let result = OidcAuthHelper::connect(OidcConfig {
        provider_url,
        client_id: CLIENT_ID.to_string(),
        ..Default::default()
    })
    .await;
    assert!(result.is_err());
}
