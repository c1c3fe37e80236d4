use mov_portal::{
    AppState,
    auth::{Authority, build_auth_state},
    config::{AppConfig, Env},
    create_router,
    models::UserRecord,
    repository::{PostgresRepository, Repository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// main
///
/// The asynchronous entry point for the application, responsible for
/// initializing all core components: Configuration, Logging, Database, the
/// authentication pipeline, and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    // AppConfig::load() implements the fail-fast principle for missing Production secrets.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment variable,
    // falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mov_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on the APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres)
    // Creates a connection pool to the Postgres instance defined in the configuration.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Instantiate the Repository, wrapping it in an Arc for thread-safe sharing.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Bootstrap Admin Account
    // Registration only ever creates MEMBER accounts, so the first ADMIN has
    // to come from configuration. Local defaults to admin/admin; Production
    // seeds only when ADMIN_USERNAME and ADMIN_PASSWORD are both set.
    ensure_bootstrap_admin(&config, &repo).await;

    // 6. Authentication Pipeline Assembly
    // Builds the immutable auth bundle: access policy, credential and token
    // authenticators, and the JWT issuer keyed from the configured secret.
    let auth = build_auth_state(&config, repo.clone());

    // 7. Unified State Assembly
    let app_state = AppState { repo, auth, config };

    // 8. Router and Server Startup
    let app = create_router(app_state);

    // Binds the TCP listener and initiates the HTTP server.
    let listener = TcpListener::bind("0.0.0.0:8080").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:8080");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:8080/swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app).await.unwrap();
}

/// ensure_bootstrap_admin
///
/// Seeds the configured admin account if it does not already exist. A no-op
/// when the credentials are absent (Production default) or the username is
/// already taken, so restarting the server never duplicates or resets it.
async fn ensure_bootstrap_admin(config: &AppConfig, repo: &RepositoryState) {
    let (Some(username), Some(password)) = (
        config.admin_username.as_deref(),
        config.admin_password.as_deref(),
    ) else {
        return;
    };

    if repo.find_user(username).await.is_some() {
        return;
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .expect("FATAL: Failed to hash the bootstrap admin password.");

    let record = UserRecord {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
        role: Authority::Admin.as_str().to_string(),
    };

    if repo.create_user(record).await.is_some() {
        tracing::info!("Bootstrap admin account '{}' created", username);
    }
}
