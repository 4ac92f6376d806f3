use std::sync::Arc;

use axum::Router;
use smalltalk::chat::coordinator::Coordinator;
use smalltalk::chat::hub::Hub;
use smalltalk::store::MessageStore;
use smalltalk::{auth, chat, db, messages, users, AppState};
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smalltalk=info")),
        )
        .init();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(1)));

    let db_url = dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:smalltalk.db".to_owned());
    let db_pool = db::connect(&db_url).await.unwrap();

    let store = MessageStore::new(db_pool.clone());
    let hub = Hub::new(256);
    let coordinator = Arc::new(Coordinator::new(store.clone(), hub.clone()));

    let app_state = AppState {
        db_pool,
        store,
        hub,
        coordinator,
    };

    let app = Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(messages::router())
        .merge(chat::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await.unwrap();
}
