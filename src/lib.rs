use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;

// Module for routing segregation (Public, Auth endpoints, Admin surface).
pub mod routes;

use auth::middleware::{credential_login_stage, token_auth_stage};
use routes::{admin, auth as auth_routes, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry
// point (main.rs) and the integration tests.
pub use auth::{AuthState, build_auth_state};
pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the portal.
/// It aggregates all handler paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros; the resulting
/// JSON is served at `/api-docs/openapi.json`.
///
/// POST /api/auth/login is deliberately missing from `paths`: the login
/// stage answers it before routing, so there is no handler to document. Its
/// request/response shapes (`LoginRequest`, `TokenPair`) are still exported
/// as schemas.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_data, handlers::get_themes, handlers::get_countries,
        handlers::get_categories, handlers::get_tags, handlers::get_content_items,
        handlers::register_user, handlers::refresh_token,
        handlers::get_me, handlers::get_admin_stats,
        handlers::create_theme, handlers::delete_theme,
    ),
    components(
        schemas(
            models::Theme, models::Country, models::Category, models::Tag,
            models::ContentItem, models::CatalogData, models::CatalogStats,
            models::User, models::UserProfile, models::LoginRequest,
            models::RegisterRequest, models::TokenPair, models::TokenResponse,
            models::CreateThemeRequest, models::ErrorResponse,
            auth::Authority,
        )
    ),
    tags(
        (name = "mov-portal", description = "Content Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across every request. The auth bundle
/// is built once at startup; nothing in here mutates afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts persistence behind the trait object.
    pub repo: RepositoryState,
    /// Authentication Layer: policy, authenticators and the token issuer.
    pub auth: AuthState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let handlers pull individual components out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, installs the fixed
/// two-stage authentication pipeline in front of it, and applies the global
/// observability middleware.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serves the auto-generated Swagger UI. Both doc paths
        // fall outside the policy's /api prefix rule, so they stay public.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Route tables, merged with absolute paths.
        .merge(public::public_routes())
        .merge(auth_routes::auth_routes())
        .merge(admin::admin_routes())
        // 3. The authentication pipeline. Applied with `.layer` (not
        // `route_layer`) so unmatched paths are judged too: a request for an
        // unknown path under /api must fail authentication before it can 404.
        // ServiceBuilder ordering makes the login stage outermost, so it sees
        // the request first; the token stage runs second.
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    credential_login_stage,
                ))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    token_auth_stage,
                )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 4. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: wraps the request/response lifecycle in
                // a span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: returns x-request-id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: includes the
/// `x-request-id` header (if present) alongside the HTTP method and URI so
/// every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
