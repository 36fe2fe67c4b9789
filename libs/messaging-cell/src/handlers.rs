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

use crate::models::SendMessageRequest;
use crate::services::MessageService;

#[axum::debug_handler]
pub async fn send_message(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = MessageService::new(&config);
    let message = service.send_message(user.id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(message))))
}

#[axum::debug_handler]
pub async fn get_conversation(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(other_user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MessageService::new(&config);
    let messages = service.get_conversation(user.id, other_user_id).await?;

    Ok(Json(json!(messages)))
}

#[axum::debug_handler]
pub async fn get_unread_count(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = MessageService::new(&config);
    let count = service.unread_count(user.id).await?;

    Ok(Json(json!({ "count": count })))
}
