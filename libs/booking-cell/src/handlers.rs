use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateBookingRequest, UpdateStatusRequest};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn create_booking(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    debug!("Booking request from {} for professional {}", user.id, request.professional_id);

    let service = BookingService::new(&config);
    let booking = service.create_booking(user.id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(booking))))
}

#[axum::debug_handler]
pub async fn get_my_bookings(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let bookings = service.get_my_bookings(&user).await?;

    Ok(Json(json!(bookings)))
}

#[axum::debug_handler]
pub async fn update_booking_status(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let booking = service.update_status(&user, booking_id, request.status).await?;

    Ok(Json(json!(booking)))
}
