use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use mov_portal::{
    AppConfig, AppState, InMemoryRepository, create_router,
    auth::{Authority, Claims, Principal, TokenUse, build_auth_state},
    models::{ErrorResponse, UserProfile, UserRecord},
    repository::{Repository, RepositoryState},
};
use std::{sync::Arc, time::SystemTime};
use tower::util::ServiceExt;
use uuid::Uuid;

const ADMIN_USERNAME: &str = "root";
const MEMBER_USERNAME: &str = "viewer";
const PASSWORD: &str = "hunter2";

// --- Test App Assembly ---

struct TestApp {
    router: Router,
    admin_token: String,
    member_token: String,
    refresh_token: String,
    jwt_secret: String,
}

/// Builds the full router over the in-memory repository, with one admin and
/// one member account seeded and tokens pre-issued for both.
async fn test_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::with_sample_catalog()) as RepositoryState;
    seed_user(&repo, ADMIN_USERNAME, Authority::Admin).await;
    seed_user(&repo, MEMBER_USERNAME, Authority::Member).await;

    let config = AppConfig::default();
    let jwt_secret = config.jwt_secret.clone();
    let auth = build_auth_state(&config, repo.clone());

    let admin = Principal::new(ADMIN_USERNAME, vec![Authority::Admin]);
    let member = Principal::new(MEMBER_USERNAME, vec![Authority::Member]);
    let admin_token = auth.issuer.issue(&admin, TokenUse::Access).unwrap();
    let member_token = auth.issuer.issue(&member, TokenUse::Access).unwrap();
    let refresh_token = auth.issuer.issue(&admin, TokenUse::Refresh).unwrap();

    let state = AppState { repo, auth, config };
    TestApp {
        router: create_router(state),
        admin_token,
        member_token,
        refresh_token,
        jwt_secret,
    }
}

async fn seed_user(repo: &RepositoryState, username: &str, authority: Authority) {
    // Low bcrypt cost keeps the suite fast; production uses DEFAULT_COST.
    let record = UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
        role: authority.as_str().to_string(),
    };
    repo.create_user(record).await.expect("seeding user failed");
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Authorization", token)
        .body(Body::empty())
        .unwrap()
}

async fn read_error(response: axum::response::Response) -> ErrorResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("rejection body must be the structured error shape")
}

// --- Missing / Broken Tokens ---

#[tokio::test]
async fn test_protected_path_without_token_is_unauthenticated() {
    let app = test_app().await;
    let response = app.router.oneshot(get("/api/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_error(response).await;
    assert_eq!(body.status, 401);
    assert_eq!(body.error, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_protected_path_with_garbage_token_is_invalid_token() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(get_with_token("/api/me", "definitely.not.ajwt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_error(response).await.error, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_expired_token_is_rejected_as_invalid() {
    let app = test_app().await;
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: ADMIN_USERNAME.to_string(),
        authorities: vec![Authority::Admin],
        token_use: TokenUse::Access,
        iat: now - 7200,
        exp: now - 3600,
    };
    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.jwt_secret.as_bytes()),
    )
    .unwrap();

    let response = app
        .router
        .oneshot(get_with_token("/api/me", &expired))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_error(response).await.error, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_token_does_not_open_the_protected_api() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(get_with_token("/api/me", &app.refresh_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_error(response).await.error, "INVALID_TOKEN");
}

// --- Authority Gate ---

#[tokio::test]
async fn test_member_token_is_forbidden_not_unauthorized() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(get_with_token("/api/me", &app.member_token))
        .await
        .unwrap();

    // Authenticated but lacking ADMIN: 403, distinct from every 401 case.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_error(response).await;
    assert_eq!(body.status, 403);
    assert_eq!(body.error, "UNAUTHORIZED");

    let response = app
        .router
        .oneshot(get_with_token("/api/admin/stats", &app.member_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_token_reaches_the_handler() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(get_with_token("/api/me", &app.admin_token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let profile: UserProfile = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(profile.username, ADMIN_USERNAME);
    assert_eq!(profile.authorities, vec![Authority::Admin]);
}

#[tokio::test]
async fn test_bearer_prefix_is_tolerated_end_to_end() {
    let app = test_app().await;
    let response = app
        .router
        .oneshot(get_with_token(
            "/api/me",
            &format!("Bearer {}", app.admin_token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// --- Authentication Precedes Routing ---

#[tokio::test]
async fn test_unknown_protected_path_needs_a_token_before_it_can_404() {
    let app = test_app().await;

    // Anonymous: the token stage answers before routing ever runs.
    let response = app
        .router
        .clone()
        .oneshot(get("/api/no-such-resource"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_error(response).await.error, "UNAUTHENTICATED");

    // Authenticated admin: falls through to the router and 404s normally.
    let response = app
        .router
        .oneshot(get_with_token("/api/no-such-resource", &app.admin_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Token-Exempt Surface ---

#[tokio::test]
async fn test_public_paths_answer_without_any_token() {
    let app = test_app().await;
    for uri in [
        "/health",
        "/api/data",
        "/api/themes",
        "/api/countries",
        "/api/categories",
        "/api/tags",
        "/api/contentItems",
        "/api-docs/openapi.json",
    ] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri} must be open");
    }
}

#[tokio::test]
async fn test_exemption_is_method_independent() {
    let app = test_app().await;

    // POST to a public catalog path: no route accepts it, so the router
    // answers 405. Authentication must not have intervened with a 401.
    let request = Request::builder()
        .method("POST")
        .uri("/api/themes")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- Login Path Ownership ---

#[tokio::test]
async fn test_non_post_login_gets_the_structured_405() {
    let app = test_app().await;
    let response = app.router.oneshot(get("/api/auth/login")).await.unwrap();

    // Unlike the router's bare 405 above, the login stage answers this one
    // itself with the structured rejection body.
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = read_error(response).await;
    assert_eq!(body.status, 405);
    assert_eq!(body.error, "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_repeated_requests_are_judged_statelessly() {
    let app = test_app().await;

    // A successful admin request must not leave any state behind that lets
    // the following anonymous request through.
    let ok = app
        .router
        .clone()
        .oneshot(get_with_token("/api/admin/stats", &app.admin_token))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let anon = app.router.oneshot(get("/api/admin/stats")).await.unwrap();
    assert_eq!(anon.status(), StatusCode::UNAUTHORIZED);
}
