use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// The token-exempt read surface. Every path registered here must also
/// appear in the access policy's public set, otherwise the token stage
/// would demand a token (and an ADMIN authority) before routing even ran.
///
/// The exemption is method-independent: these paths only mount GET, so any
/// other method 405s at the router, but it never trips authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(handlers::health))
        // GET /api/data
        // The aggregate catalog payload the SPA hydrates from.
        .route("/api/data", get(handlers::get_data))
        // GET /api/themes
        // Lists catalog themes (names are unique and uppercase).
        .route("/api/themes", get(handlers::get_themes))
        // GET /api/countries
        .route("/api/countries", get(handlers::get_countries))
        // GET /api/categories
        .route("/api/categories", get(handlers::get_categories))
        // GET /api/tags
        .route("/api/tags", get(handlers::get_tags))
        // GET /api/contentItems
        // Path segment is camelCased to match the frontend's resource name.
        .route("/api/contentItems", get(handlers::get_content_items))
}
