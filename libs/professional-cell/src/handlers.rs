use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{AvailabilityQuery, SearchQuery, UpsertProfileRequest};
use crate::services::{
    AvailabilityService, ProfileService, SearchCriteria, SearchService, SupabaseMediaStore,
};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_professionals(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let criteria = SearchCriteria::from_query(query)?;

    let service = SearchService::new(&config);
    let results = service.search(&criteria).await?;

    Ok(Json(json!(results)))
}

#[axum::debug_handler]
pub async fn get_professional(
    State(config): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config, SupabaseMediaStore::new(&config));
    let profile = service.get_profile(professional_id).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(config): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let profiles = ProfileService::new(&config, SupabaseMediaStore::new(&config));
    profiles.get_professional(professional_id).await?;

    let availability = AvailabilityService::new(&config);
    let slots = availability
        .list_slots(professional_id, query.available_only.unwrap_or(false))
        .await?;

    Ok(Json(json!(slots)))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn upsert_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertProfileRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, Role::Professional)?;
    debug!("Profile update from professional user {}", user.id);

    let service = ProfileService::new(&config, SupabaseMediaStore::new(&config));
    let profile = service.upsert_profile(user.id, request).await?;

    Ok(Json(json!(profile)))
}
