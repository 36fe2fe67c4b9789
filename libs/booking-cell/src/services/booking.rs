use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use professional_cell::models::{AvailabilitySlot, Professional};
use professional_cell::services::availability::format_instant;
use professional_cell::services::AvailabilityService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    Booking, BookingError, BookingStatus, BookingWithParties, CreateBookingRequest, BOOKING_HOURS,
};
use crate::services::lifecycle::{BookingLifecycle, BookingParty};

/// Upper bound on reserve attempts when concurrent requests keep winning the slot.
pub const MAX_RESERVATION_ATTEMPTS: u32 = 3;

const BOOKING_SELECT: &str = "*,user:users(id,name,email,phone),professional:professionals(id,user_id,services,hourly_rate,user:users(id,name,email,phone))";

fn slot_label(slot: &AvailabilitySlot) -> String {
    format!("{}-{}", slot.start.format("%H:%M"), slot.end.format("%H:%M"))
}

pub struct BookingService {
    supabase: SupabaseClient,
    availability: AvailabilityService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = SupabaseClient::new(config);
        Self {
            availability: AvailabilityService::with_client(supabase.clone()),
            supabase,
        }
    }

    async fn get_professional(&self, professional_id: Uuid) -> Result<Professional, BookingError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Professional> = self.supabase.request(Method::GET, &path, None).await?;
        result.into_iter().next().ok_or(BookingError::ProfessionalNotFound)
    }

    async fn professional_id_of(&self, user_id: Uuid) -> Result<Option<Uuid>, BookingError> {
        let path = format!("/rest/v1/professionals?user_id=eq.{}&select=id,user_id", user_id);
        let result: Vec<serde_json::Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result
            .first()
            .and_then(|row| row.get("id"))
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok()))
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let result: Vec<Booking> = self.supabase.request(Method::GET, &path, None).await?;
        result.into_iter().next().ok_or(BookingError::NotFound)
    }

    /// Finds an open slot containing `request.date` and books it. The slot is
    /// claimed with a conditional update; losing the race re-queries for
    /// another open slot, up to [`MAX_RESERVATION_ATTEMPTS`] times.
    pub async fn create_booking(&self, user_id: Uuid, request: CreateBookingRequest) -> Result<Booking, BookingError> {
        let service = request.service.trim().to_string();
        if service.is_empty() {
            return Err(BookingError::Validation("Service is required".to_string()));
        }

        let professional = self.get_professional(request.professional_id).await?;
        if professional.user_id == user_id {
            return Err(BookingError::Validation("You cannot book your own services".to_string()));
        }
        if !professional.services.iter().any(|s| s == &service) {
            return Err(BookingError::Validation("Professional does not offer this service".to_string()));
        }

        let slot = self.reserve_with_retry(professional.id, &request).await?;

        let now = Utc::now().to_rfc3339();
        let booking_data = json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "professional_id": professional.id,
            "slot_id": slot.id,
            "service": service,
            "date": format_instant(request.date),
            "time_slot": request.time_slot.unwrap_or_else(|| slot_label(&slot)),
            "address": request.address,
            "total_price": professional.hourly_rate * BOOKING_HOURS,
            "status": BookingStatus::Pending,
            "created_at": now,
            "updated_at": now
        });

        let inserted = self.supabase
            .request_returning::<Booking>(Method::POST, "/rest/v1/bookings", Some(booking_data))
            .await
            .map_err(BookingError::from)
            .and_then(|rows| {
                rows.into_iter()
                    .next()
                    .ok_or_else(|| BookingError::Validation("Failed to create booking".to_string()))
            });

        match inserted {
            Ok(booking) => {
                info!("Booking {} created on slot {}", booking.id, slot.id);
                Ok(booking)
            }
            Err(e) => {
                error!("Booking insert failed, releasing slot {}: {}", slot.id, e);
                if let Err(release_err) = self.availability.release_slot(slot.id).await {
                    error!("Failed to release slot {}: {}", slot.id, release_err);
                }
                Err(e)
            }
        }
    }

    async fn reserve_with_retry(
        &self,
        professional_id: Uuid,
        request: &CreateBookingRequest,
    ) -> Result<AvailabilitySlot, BookingError> {
        for attempt in 1..=MAX_RESERVATION_ATTEMPTS {
            let candidate = match self.availability.find_open_slot(professional_id, request.date).await? {
                Some(slot) => slot,
                None => {
                    debug!("No open slot for professional {} at {}", professional_id, request.date);
                    return Err(BookingError::SlotUnavailable);
                }
            };

            if let Some(slot) = self.availability.reserve_slot(candidate.id).await? {
                return Ok(slot);
            }

            warn!(
                "Slot {} taken concurrently (attempt {}/{})",
                candidate.id, attempt, MAX_RESERVATION_ATTEMPTS
            );
        }

        Err(BookingError::SlotUnavailable)
    }

    /// Bookings the caller made, plus those made with the caller's professional
    /// profile. Newest first.
    pub async fn get_my_bookings(&self, user: &User) -> Result<Vec<BookingWithParties>, BookingError> {
        let filter = match self.professional_id_of(user.id).await? {
            Some(professional_id) => format!("or=(user_id.eq.{},professional_id.eq.{})", user.id, professional_id),
            None => format!("user_id=eq.{}", user.id),
        };

        let path = format!("/rest/v1/bookings?{}&select={}&order=created_at.desc", filter, BOOKING_SELECT);
        let bookings: Vec<BookingWithParties> = self.supabase.request(Method::GET, &path, None).await?;

        debug!("Found {} bookings for user {}", bookings.len(), user.id);
        Ok(bookings)
    }

    pub async fn update_status(
        &self,
        user: &User,
        booking_id: Uuid,
        next: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking(booking_id).await?;

        let caller_professional_id = if user.is_admin() || booking.user_id == user.id {
            None
        } else {
            self.professional_id_of(user.id).await?
        };

        let party = BookingParty::of(user, &booking, caller_professional_id).ok_or(BookingError::Forbidden)?;
        BookingLifecycle::authorize(party, next)?;
        BookingLifecycle::validate_transition(booking.status, next)?;

        // Guarded on the current status so two updates cannot both apply
        let path = format!("/rest/v1/bookings?id=eq.{}&status=eq.{}", booking_id, booking.status);
        let updated: Vec<Booking> = self.supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(json!({ "status": next, "updated_at": Utc::now().to_rfc3339() })),
            )
            .await?;

        let updated = match updated.into_iter().next() {
            Some(b) => b,
            None => {
                let current = self.get_booking(booking_id).await?;
                return Err(BookingError::InvalidTransition { from: current.status, to: next });
            }
        };

        if next == BookingStatus::Cancelled {
            if let Some(slot_id) = updated.slot_id {
                self.release_after_cancel(booking_id, slot_id).await;
            }
        }

        info!("Booking {} moved {} -> {} by {:?}", booking_id, booking.status, next, party);
        Ok(updated)
    }
}

impl BookingService {
    /// The cancellation is already committed, so a failed release is retried
    /// once and then logged rather than surfaced to the caller.
    async fn release_after_cancel(&self, booking_id: Uuid, slot_id: Uuid) {
        if let Err(first) = self.availability.release_slot(slot_id).await {
            warn!("Releasing slot {} for cancelled booking {} failed, retrying: {}", slot_id, booking_id, first);
            if let Err(second) = self.availability.release_slot(slot_id).await {
                error!("Slot {} stays booked after cancelling booking {}: {}", slot_id, booking_id, second);
            }
        }
    }
}
