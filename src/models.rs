use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Authority;

// --- Catalog Schemas (Mapped to Database) ---

/// Theme
///
/// A curated catalog theme from the `public.themes` table. Theme names are
/// unique and always stored uppercase; every write path normalizes through
/// [`Theme::normalized_name`] so "history", " History " and "HISTORY" are the
/// same theme.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Theme {
    pub id: i64,
    // Unique, uppercase. See `normalized_name`.
    pub name: String,
    pub description: Option<String>,
}

impl Theme {
    /// The canonical storage form of a theme name: trimmed, then uppercased.
    /// The unique constraint on `themes.name` operates on this form only.
    pub fn normalized_name(name: &str) -> String {
        name.trim().to_uppercase()
    }
}

/// Country
///
/// A production country from the `public.countries` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Country {
    pub id: i64,
    pub name: String,
}

/// Category
///
/// A catalog category from the `public.categories` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Tag
///
/// A free-form label from the `public.tags` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// ContentItem
///
/// A catalog entry from the `public.content_items` table. The foreign keys
/// are optional: an item can exist before it has been filed under a theme,
/// category or country.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    // FK to public.themes.id.
    pub theme_id: Option<i64>,
    // FK to public.categories.id.
    pub category_id: Option<i64>,
    // FK to public.countries.id.
    pub country_id: Option<i64>,
}

/// CatalogData
///
/// The aggregate the SPA fetches in one request (GET /api/data) instead of
/// five. Field names are camelCased so `contentItems` matches the dedicated
/// `/api/contentItems` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogData {
    pub themes: Vec<Theme>,
    pub countries: Vec<Country>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub content_items: Vec<ContentItem>,
}

// --- User Schemas ---

/// UserRecord
///
/// Raw Database Row (Internal Use). Directly maps to the `public.users`
/// table. Carries the bcrypt hash, so it is never serialized to clients;
/// the outward projection is [`User`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    // Stored as the authority code ("ADMIN" / "MEMBER").
    pub role: String,
}

impl UserRecord {
    /// The typed authority this record grants. An unrecognized code demotes
    /// to Member so a bad row can never widen access.
    pub fn authority(&self) -> Authority {
        self.role.parse().unwrap_or_else(|_| {
            tracing::warn!(
                username = %self.username,
                role = %self.role,
                "unknown role code on user record, treating as MEMBER"
            );
            Authority::Member
        })
    }
}

/// User
///
/// Public projection of a user account, returned by the registration
/// endpoint. No credential material.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Authority,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username.clone(),
            role: record.authority(),
        }
    }
}

/// UserProfile
///
/// Output schema for the authenticated caller's own identity (GET /api/me),
/// built from the request principal rather than a database read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub username: String,
    pub authorities: Vec<Authority>,
}

// --- Auth Payloads (Input/Output Schemas) ---

/// LoginRequest
///
/// Input payload the login stage reads from POST /api/auth/login. The
/// password is compared against the stored bcrypt hash and never persisted
/// or logged in clear text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST
/// /api/auth/register). Registration always creates a MEMBER account; there
/// is no way to request an authority from the outside.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// TokenPair
///
/// Output of a successful login: a short-lived access token plus the
/// longer-lived refresh token. camelCased so the JSON keys are `token` and
/// `refreshToken`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// TokenResponse
///
/// Output of the refresh endpoint: a fresh access token only. The refresh
/// token itself is not rotated.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

// --- Moderation & Dashboard Schemas ---

/// CreateThemeRequest
///
/// Input payload for creating a theme (POST /api/admin/themes). The name is
/// normalized before storage, so clients may send any casing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateThemeRequest {
    pub name: String,
    pub description: Option<String>,
}

/// CatalogStats
///
/// Output schema for the administrative statistics dashboard
/// (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CatalogStats {
    pub total_themes: i64,
    pub total_countries: i64,
    pub total_categories: i64,
    pub total_tags: i64,
    pub total_content_items: i64,
    pub total_users: i64,
}

// --- Error Schema ---

/// ErrorResponse
///
/// The single structured body every authentication rejection uses, so
/// clients can branch on `error` without parsing prose. `status` mirrors the
/// HTTP status code of the response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub status: u16,
    // Stable machine-readable code, e.g. "INVALID_TOKEN".
    pub error: String,
    pub message: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}
