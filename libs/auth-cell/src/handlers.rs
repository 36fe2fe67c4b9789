use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::user::GeoPoint;

use crate::models::{
    LocationResponse, LoginRequest, RegisterRequest, UpdateLocationRequest,
    VerifyCodeRequest, VerifyPhoneRequest, AuthError,
};
use crate::services::{AccountService, PhoneVerificationService, TwilioSmsClient};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AccountService::new(&config);
    let response = service.register(request).await?;

    Ok((StatusCode::CREATED, Json(json!(response))))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let response = service.login(request).await?;

    Ok(Json(json!(response)))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn verify_phone(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<VerifyPhoneRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Phone verification requested by {}", user.id);

    let phone = request.phone
        .filter(|p| !p.trim().is_empty())
        .ok_or(AuthError::InvalidPhone)?;

    let accounts = AccountService::new(&config);
    let record = accounts.get_user(user.id).await?;

    let verification = PhoneVerificationService::new(&config, TwilioSmsClient::new(&config));
    verification.request_code(&record, phone.trim()).await?;

    Ok(Json(json!({ "msg": "Verification code sent" })))
}

#[axum::debug_handler]
pub async fn verify_code(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let accounts = AccountService::new(&config);
    let record = accounts.get_user(user.id).await?;

    let verification = PhoneVerificationService::new(&config, TwilioSmsClient::new(&config));
    verification.verify_code(&record, &request.code).await?;

    Ok(Json(json!({ "msg": "Phone verified successfully" })))
}

#[axum::debug_handler]
pub async fn get_me(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let profile = service.get_profile(user.id).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_location(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<Value>, AppError> {
    let (lat, lng) = match (request.lat, request.lng) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => return Err(AppError::BadRequest("Latitude and longitude required".to_string())),
    };

    let service = AccountService::new(&config);
    let location = service.update_location(user.id, GeoPoint::new(lat, lng)).await?;

    Ok(Json(json!(LocationResponse {
        msg: "Location updated".to_string(),
        location,
    })))
}
