use crate::{
    AppState,
    auth::{AuthError, Authority, Principal, TokenUse, token::extract_token},
    models::{
        CatalogData, CatalogStats, Category, ContentItem, Country, CreateThemeRequest,
        RegisterRequest, Tag, Theme, TokenResponse, User, UserProfile, UserRecord,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

// --- Public Catalog Handlers ---

/// get_data
///
/// [Public Route] Returns the whole catalog in one aggregate payload so the
/// SPA can hydrate with a single request instead of five.
#[utoipa::path(
    get,
    path = "/api/data",
    responses((status = 200, description = "Full catalog", body = CatalogData))
)]
pub async fn get_data(State(state): State<AppState>) -> Json<CatalogData> {
    Json(CatalogData {
        themes: state.repo.get_themes().await,
        countries: state.repo.get_countries().await,
        categories: state.repo.get_categories().await,
        tags: state.repo.get_tags().await,
        content_items: state.repo.get_content_items().await,
    })
}

/// get_themes
///
/// [Public Route] Lists all catalog themes.
#[utoipa::path(
    get,
    path = "/api/themes",
    responses((status = 200, description = "Themes", body = [Theme]))
)]
pub async fn get_themes(State(state): State<AppState>) -> Json<Vec<Theme>> {
    Json(state.repo.get_themes().await)
}

/// get_countries
///
/// [Public Route] Lists all production countries.
#[utoipa::path(
    get,
    path = "/api/countries",
    responses((status = 200, description = "Countries", body = [Country]))
)]
pub async fn get_countries(State(state): State<AppState>) -> Json<Vec<Country>> {
    Json(state.repo.get_countries().await)
}

/// get_categories
///
/// [Public Route] Lists all catalog categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.repo.get_categories().await)
}

/// get_tags
///
/// [Public Route] Lists all tags.
#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn get_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    Json(state.repo.get_tags().await)
}

/// get_content_items
///
/// [Public Route] Lists all catalog content items.
#[utoipa::path(
    get,
    path = "/api/contentItems",
    responses((status = 200, description = "Content items", body = [ContentItem]))
)]
pub async fn get_content_items(State(state): State<AppState>) -> Json<Vec<ContentItem>> {
    Json(state.repo.get_content_items().await)
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates a new MEMBER account. The requested authority is
/// never taken from the payload; promotion to ADMIN happens out of band.
///
/// *Validation*: Blank usernames (after trimming) and empty passwords are
/// rejected with 400; a taken username yields 409.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Blank username or password"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>, StatusCode> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let record = UserRecord {
        id: Uuid::new_v4(),
        username,
        password_hash,
        role: Authority::Member.as_str().to_string(),
    };

    match state.repo.create_user(record).await {
        Some(created) => {
            tracing::info!(username = %created.username, "account registered");
            Ok(Json(User::from(&created)))
        }
        None => Err(StatusCode::CONFLICT),
    }
}

/// refresh_token
///
/// [Public-Path Route] Exchanges a valid refresh token (presented in
/// `X-Authorization`, like any other token) for a fresh access token.
///
/// *Security*: Unlike access-token verification, refresh re-reads the account
/// from the directory, so a deleted user or a changed role takes effect here
/// at the latest. An access token presented to this endpoint is rejected.
#[utoipa::path(
    post,
    path = "/api/auth/token",
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Missing or invalid refresh token", body = crate::models::ErrorResponse)
    )
)]
pub async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = extract_token(&headers) else {
        return AuthError::Unauthenticated.into_response();
    };
    let claims = match state.auth.issuer.decode(token) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };
    if claims.token_use != TokenUse::Refresh {
        return AuthError::InvalidToken.into_response();
    }

    let Some(user) = state.repo.find_user(&claims.sub).await else {
        // The account vanished since the refresh token was minted.
        return AuthError::InvalidToken.into_response();
    };

    let authority = user.authority();
    let principal = Principal::new(user.username, vec![authority]);
    match state.auth.issuer.issue(&principal, TokenUse::Access) {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(err) => {
            tracing::error!("token issuance failed: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Protected Handlers ---

/// get_me
///
/// [Protected Route] Echoes the authenticated caller's identity straight
/// from the request principal, with no database read.
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(principal: Principal) -> Json<UserProfile> {
    Json(UserProfile {
        username: principal.username,
        authorities: principal.authorities,
    })
}

/// get_admin_stats
///
/// [Admin Route] Retrieves the catalog counters for the dashboard.
///
/// *Authorization*: The token stage already gates `/api/**` on ADMIN; the
/// handler re-checks the principal so the requirement holds even if the
/// route is ever re-mounted.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Stats", body = CatalogStats))
)]
pub async fn get_admin_stats(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<CatalogStats>, StatusCode> {
    if !principal.has_authority(Authority::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}

/// create_theme
///
/// [Admin Route] Creates a catalog theme. The name is normalized (trimmed,
/// uppercased) before storage, so "history" and "HISTORY" collide.
#[utoipa::path(
    post,
    path = "/api/admin/themes",
    request_body = CreateThemeRequest,
    responses(
        (status = 200, description = "Created", body = Theme),
        (status = 400, description = "Blank name"),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_theme(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<CreateThemeRequest>,
) -> Result<Json<Theme>, StatusCode> {
    if !principal.has_authority(Authority::Admin) {
        return Err(StatusCode::FORBIDDEN);
    }
    if payload.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    match state
        .repo
        .create_theme(payload.name, payload.description)
        .await
    {
        Some(theme) => Ok(Json(theme)),
        None => Err(StatusCode::CONFLICT),
    }
}

/// delete_theme
///
/// [Admin Route] Removes a theme by id. 404 covers both "never existed" and
/// "already deleted"; the operation is idempotent from the client's view.
#[utoipa::path(
    delete,
    path = "/api/admin/themes/{id}",
    params(("id" = i64, Path, description = "Theme ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_theme(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> StatusCode {
    if !principal.has_authority(Authority::Admin) {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_theme(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// health
///
/// [Public Route] Liveness probe. No database access.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Alive"))
)]
pub async fn health() -> &'static str {
    "ok"
}
