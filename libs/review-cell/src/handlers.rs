use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreateReviewRequest;
use crate::services::ReviewService;

#[axum::debug_handler]
pub async fn create_review(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ReviewService::new(&config);
    let review = service.create_review(user.id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(review))))
}

#[axum::debug_handler]
pub async fn get_professional_reviews(
    State(config): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&config);
    let reviews = service.list_for_professional(professional_id).await?;

    Ok(Json(json!(reviews)))
}
