mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use axum_embed::ServeEmbed;
use clap::Parser;
use common::{auth::auth_middleware, AppState, Config};
use database::Database;
use expenses::repository::{ExpenseRepository, SqlExpenseRepository};
use handlers::preferences::{root_redirect, set_locale};
use rust_embed::RustEmbed;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(RustEmbed, Clone)]
#[folder = "public/"]
struct Assets;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from .env, environment and CLI args
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // 3. Initialize Database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let repo: Arc<dyn ExpenseRepository> = Arc::new(SqlExpenseRepository::new(db.clone()));
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // 4. Routing
    let app = build_router(state, repo);

    // 5. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if !config.secure_cookies {
        tracing::warn!("SECURE_COOKIES is off; session cookies will be sent over plain HTTP.");
    }
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>, repo: Arc<dyn ExpenseRepository>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies);

    let protected_routes = Router::<Arc<AppState>>::new()
        .route("/", get(root_redirect))
        .route("/locale", post(set_locale))
        .nest("/expenses", expenses::handler::expenses_router(state.clone(), repo))
        .layer(middleware::from_fn(auth_middleware));

    Router::<Arc<AppState>>::new()
        .nest_service("/public", ServeEmbed::<Assets>::new())
        .merge(users::handler::auth_router(state.clone()))
        .merge(protected_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
