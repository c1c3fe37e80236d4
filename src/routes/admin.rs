use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Admin Router Module
///
/// Everything mounted here sits under the `/api` prefix rule, so the token
/// stage has already verified an access token and the ADMIN authority before
/// routing happens. Handlers still re-check the principal they receive; the
/// two checks can only disagree if a route is mounted on a path the policy
/// does not protect, which the route tests pin down.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me
        // The caller's own identity, echoed from the verified token claims.
        .route("/api/me", get(handlers::get_me))
        // GET /api/admin/stats
        // Dashboard counters across the whole catalog plus the user directory.
        .route("/api/admin/stats", get(handlers::get_admin_stats))
        // POST /api/admin/themes
        // Creates a theme; the name is normalized to uppercase and must be new.
        .route("/api/admin/themes", post(handlers::create_theme))
        // DELETE /api/admin/themes/{id}
        // Removes a theme. 404 when the id never existed or is already gone.
        .route("/api/admin/themes/{id}", delete(handlers::delete_theme))
}
