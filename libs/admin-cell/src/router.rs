use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Moderation endpoints. Every handler also checks for the admin role.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/professionals/{professional_id}/premium", patch(handlers::toggle_premium))
        .route("/professionals/{professional_id}/verify-id", patch(handlers::verify_id))
        .route("/flagged-messages", get(handlers::get_flagged_messages))
        .route("/categories", post(handlers::create_category))
        .route("/stats", get(handlers::get_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn category_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_categories))
        .with_state(state)
}
