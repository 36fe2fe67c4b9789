use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{CreateCategoryRequest, PremiumResponse, VerifyIdResponse};
use crate::services::{CategoryService, ModerationService};

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn toggle_premium(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let service = ModerationService::new(&config);
    let is_premium = service.toggle_premium(professional_id).await?;

    Ok(Json(json!(PremiumResponse {
        msg: "Premium status updated".to_string(),
        is_premium,
    })))
}

#[axum::debug_handler]
pub async fn verify_id(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let service = ModerationService::new(&config);
    let id_verified = service.verify_id(professional_id).await?;

    Ok(Json(json!(VerifyIdResponse {
        msg: "ID verified".to_string(),
        id_verified,
    })))
}

#[axum::debug_handler]
pub async fn get_flagged_messages(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let service = ModerationService::new(&config);
    let messages = service.flagged_messages().await?;

    Ok(Json(json!(messages)))
}

#[axum::debug_handler]
pub async fn create_category(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, Role::Admin)?;

    let service = CategoryService::new(&config);
    let category = service.create_category(&request.name).await?;

    Ok((StatusCode::CREATED, Json(json!(category))))
}

#[axum::debug_handler]
pub async fn get_stats(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Admin)?;

    let service = ModerationService::new(&config);
    let stats = service.stats().await?;

    Ok(Json(json!(stats)))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_categories(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = CategoryService::new(&config);
    let categories = service.list_categories().await?;

    Ok(Json(json!(categories)))
}
