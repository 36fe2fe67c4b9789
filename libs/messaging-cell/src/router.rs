use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn message_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::send_message))
        .route("/conversation/{user_id}", get(handlers::get_conversation))
        .route("/unread-count", get(handlers::get_unread_count))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
