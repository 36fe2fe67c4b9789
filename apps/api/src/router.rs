use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::get,
};

use admin_cell::router::{admin_routes, category_routes};
use auth_cell::router::{auth_routes, user_routes};
use booking_cell::router::booking_routes;
use messaging_cell::router::message_routes;
use professional_cell::router::professional_routes;
use review_cell::router::review_routes;
use shared_config::AppConfig;
use shared_utils::rate_limit::{RateLimiter, rate_limit_middleware};

pub fn create_router(state: Arc<AppConfig>, limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/professionals", professional_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/messages", message_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .nest("/categories", category_routes(state))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    Router::new()
        .route("/", get(|| async { "Dora API is running" }))
        .nest("/api", api)
}
