pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::db::ItemStore;

pub use routes::ApiError;

/// State shared by all route handlers
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<ItemStore>,
}

/// Build the deals router with CORS open to any origin
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/deals", get(routes::get_deals))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}
