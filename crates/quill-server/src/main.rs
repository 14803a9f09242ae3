use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::auth::{self, AppState, AppStateInner};
use quill_api::middleware::{optional_auth, require_auth};
use quill_api::{claps, comments, images, stories, users};
use quill_core::{ClapLedger, StoryCollection, StoryStore};
use quill_db::{Database, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let upload_dir = std::env::var("QUILL_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and the persistence port over it
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);
    let store = SqliteStore::new(db.clone());
    let port_store = Arc::new(store.clone()) as Arc<dyn StoryStore>;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        store,
        stories: StoryCollection::new(port_store.clone()),
        claps: ClapLedger::new(port_store),
        jwt_secret,
        upload_dir: PathBuf::from(upload_dir),
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/stories", get(stories::feed))
        .route("/stories/{story_id}/comments", get(comments::list_comments))
        .route("/users/{user_id}", get(users::profile))
        .route("/images/{image}", get(images::serve_image))
        .with_state(app_state.clone());

    // The story page is public but personalizes for a signed-in viewer.
    let viewer_routes = Router::new()
        .route("/stories/{story_id}", get(stories::story_page))
        .layer(middleware::from_fn(optional_auth))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route(
            "/me/stories",
            get(stories::my_stories).post(stories::create_story),
        )
        .route("/me/stories/{story_id}", get(stories::editor_story))
        .route("/me/stories/{story_id}/save", post(stories::save_story))
        .route("/me/stories/{story_id}/publish", post(stories::publish_story))
        .route("/me/stories/{story_id}/images", post(images::upload_image))
        .route("/stories/{story_id}/clap", post(claps::toggle_clap))
        .route("/stories/{story_id}/comments", post(comments::add_comment))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
