use crate::traits::EntryStore;
use crate::types::PostView;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/news/{n}", get(get_last_n_posts))
        .with_state(state)
}

/// Serve a front-end from `dir` for every path the API does not handle.
pub fn with_static_dir(router: Router, dir: &std::path::Path) -> Router {
    info!("Serving static files from {}", dir.display());
    let serve_dir = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
    router.fallback_service(serve_dir)
}

/// `GET /news/{n}`: the `n` most recently published entries.
pub async fn get_last_n_posts(
    State(state): State<AppState>,
    Path(n): Path<String>,
) -> impl IntoResponse {
    let n: usize = match n.parse() {
        Ok(n) => n,
        Err(_) => {
            debug!("Rejecting non-numeric count {:?}", n);
            return (StatusCode::BAD_REQUEST, "Invalid number format").into_response();
        }
    };

    match state.store.query_recent(n).await {
        Ok(entries) => {
            let posts: Vec<PostView> = entries.iter().map(PostView::from).collect();
            (StatusCode::OK, Json(posts)).into_response()
        }
        Err(e) => {
            error!("Error retrieving posts: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving posts").into_response()
        }
    }
}

pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server running on {}", addr);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
