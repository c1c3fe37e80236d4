use crate::models::{CatalogStats, Category, ContentItem, Country, Tag, Theme, UserRecord};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers and
/// the authentication providers talk to this trait only, so the same code
/// runs against Postgres in production and the in-memory store in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog Reads (public surface) ---
    async fn get_themes(&self) -> Vec<Theme>;
    async fn get_countries(&self) -> Vec<Country>;
    async fn get_categories(&self) -> Vec<Category>;
    async fn get_tags(&self) -> Vec<Tag>;
    async fn get_content_items(&self) -> Vec<ContentItem>;

    // --- Theme Moderation (admin surface) ---
    // The name is normalized (trimmed, uppercased) before storage.
    // Returns None when the normalized name collides with an existing theme.
    async fn create_theme(&self, name: String, description: Option<String>) -> Option<Theme>;
    // Returns true only if a row was actually removed.
    async fn delete_theme(&self, id: i64) -> bool;

    // --- User Directory ---
    // Username lookup is exact and case-sensitive.
    async fn find_user(&self, username: &str) -> Option<UserRecord>;
    // Returns None when the username is already taken.
    async fn create_user(&self, user: UserRecord) -> Option<UserRecord>;

    // --- Dashboard ---
    async fn get_stats(&self) -> CatalogStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_themes(&self) -> Vec<Theme> {
        sqlx::query_as::<_, Theme>("SELECT id, name, description FROM themes ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_themes error: {:?}", e);
                vec![]
            })
    }

    async fn get_countries(&self) -> Vec<Country> {
        sqlx::query_as::<_, Country>("SELECT id, name FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_countries error: {:?}", e);
                vec![]
            })
    }

    async fn get_categories(&self) -> Vec<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_categories error: {:?}", e);
                vec![]
            })
    }

    async fn get_tags(&self) -> Vec<Tag> {
        sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_tags error: {:?}", e);
                vec![]
            })
    }

    async fn get_content_items(&self) -> Vec<ContentItem> {
        sqlx::query_as::<_, ContentItem>(
            r#"
            SELECT id, title, description, year, theme_id, category_id, country_id
            FROM content_items
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_content_items error: {:?}", e);
            vec![]
        })
    }

    /// create_theme
    ///
    /// Normalizes the name, then relies on the unique constraint on
    /// `themes.name` to reject duplicates atomically. A unique violation is an
    /// expected outcome and maps to `None`; any other database error is
    /// logged before mapping to the same.
    async fn create_theme(&self, name: String, description: Option<String>) -> Option<Theme> {
        let name = Theme::normalized_name(&name);
        let result = sqlx::query_as::<_, Theme>(
            "INSERT INTO themes (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&name)
        .bind(&description)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(theme) => Some(theme),
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if !duplicate {
                    tracing::error!("create_theme error: {:?}", e);
                }
                None
            }
        }
    }

    async fn delete_theme(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM themes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_theme error: {:?}", e);
                false
            }
        }
    }

    /// find_user
    ///
    /// Retrieves the full directory record, including the password hash, for
    /// credential verification. Callers must never serialize the result.
    async fn find_user(&self, username: &str) -> Option<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new directory record. The unique constraint on
    /// `users.username` turns a duplicate registration into `None`.
    async fn create_user(&self, user: UserRecord) -> Option<UserRecord> {
        let result = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, role
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if !duplicate {
                    tracing::error!("create_user error: {:?}", e);
                }
                None
            }
        }
    }

    /// get_stats
    ///
    /// Compiles all counters for the administrative dashboard in one call.
    /// A failed counter falls back to 0 rather than failing the dashboard.
    async fn get_stats(&self) -> CatalogStats {
        let total_themes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM themes")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_countries = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_categories = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_tags = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_content_items =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM content_items")
                .fetch_one(&self.pool)
                .await
                .unwrap_or(0);
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        CatalogStats {
            total_themes,
            total_countries,
            total_categories,
            total_tags,
            total_content_items,
            total_users,
        }
    }
}

/// InMemoryRepository
///
/// A complete in-process implementation backed by a mutex-guarded store.
/// Tests build their fixtures on it; it honors the same contracts as the
/// Postgres implementation (normalized unique theme names, unique usernames).
pub struct InMemoryRepository {
    store: Mutex<MemoryStore>,
}

#[derive(Default)]
struct MemoryStore {
    themes: Vec<Theme>,
    countries: Vec<Country>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    content_items: Vec<ContentItem>,
    users: Vec<UserRecord>,
    // Single id sequence shared by all catalog tables.
    next_id: i64,
}

impl MemoryStore {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(MemoryStore {
                next_id: 1,
                ..MemoryStore::default()
            }),
        }
    }

    /// A repository pre-seeded with a small but fully linked catalog, enough
    /// for the aggregate endpoint and the dashboard counters to be non-trivial.
    pub fn with_sample_catalog() -> Self {
        let repo = Self::new();
        {
            let mut store = repo.store.lock().expect("repository store poisoned");

            let history = store.next_id();
            let nature = store.next_id();
            store.themes.push(Theme {
                id: history,
                name: "HISTORY".to_string(),
                description: Some("Documentaries about the past".to_string()),
            });
            store.themes.push(Theme {
                id: nature,
                name: "NATURE".to_string(),
                description: None,
            });

            let france = store.next_id();
            let japan = store.next_id();
            store.countries.push(Country {
                id: france,
                name: "France".to_string(),
            });
            store.countries.push(Country {
                id: japan,
                name: "Japan".to_string(),
            });

            let documentary = store.next_id();
            store.categories.push(Category {
                id: documentary,
                name: "Documentary".to_string(),
            });

            let archive = store.next_id();
            store.tags.push(Tag {
                id: archive,
                name: "archive".to_string(),
            });

            let item_id = store.next_id();
            store.content_items.push(ContentItem {
                id: item_id,
                title: "The Longest Century".to_string(),
                description: Some("A four-part archive series".to_string()),
                year: Some(2019),
                theme_id: Some(history),
                category_id: Some(documentary),
                country_id: Some(france),
            });
        }
        repo
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_themes(&self) -> Vec<Theme> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .themes
            .clone()
    }

    async fn get_countries(&self) -> Vec<Country> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .countries
            .clone()
    }

    async fn get_categories(&self) -> Vec<Category> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .categories
            .clone()
    }

    async fn get_tags(&self) -> Vec<Tag> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .tags
            .clone()
    }

    async fn get_content_items(&self) -> Vec<ContentItem> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .content_items
            .clone()
    }

    async fn create_theme(&self, name: String, description: Option<String>) -> Option<Theme> {
        let name = Theme::normalized_name(&name);
        let mut store = self.store.lock().expect("repository store poisoned");
        if store.themes.iter().any(|t| t.name == name) {
            return None;
        }
        let theme = Theme {
            id: store.next_id(),
            name,
            description,
        };
        store.themes.push(theme.clone());
        Some(theme)
    }

    async fn delete_theme(&self, id: i64) -> bool {
        let mut store = self.store.lock().expect("repository store poisoned");
        let before = store.themes.len();
        store.themes.retain(|t| t.id != id);
        store.themes.len() < before
    }

    async fn find_user(&self, username: &str) -> Option<UserRecord> {
        self.store
            .lock()
            .expect("repository store poisoned")
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn create_user(&self, user: UserRecord) -> Option<UserRecord> {
        let mut store = self.store.lock().expect("repository store poisoned");
        if store.users.iter().any(|u| u.username == user.username) {
            return None;
        }
        store.users.push(user.clone());
        Some(user)
    }

    async fn get_stats(&self) -> CatalogStats {
        let store = self.store.lock().expect("repository store poisoned");
        CatalogStats {
            total_themes: store.themes.len() as i64,
            total_countries: store.countries.len() as i64,
            total_categories: store.categories.len() as i64,
            total_tags: store.tags.len() as i64,
            total_content_items: store.content_items.len() as i64,
            total_users: store.users.len() as i64,
        }
    }
}
