use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DbResult, SupabaseClient};

use crate::models::{AvailabilitySlot, ProfessionalError, SlotInput};

/// RFC 3339 with a `Z` suffix, keeping any sub-second part so range filters
/// compare the exact instant.
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn validate_slots(slots: &[SlotInput]) -> Result<(), ProfessionalError> {
    for slot in slots {
        if slot.start >= slot.end {
            return Err(ProfessionalError::Validation(
                "Availability slot start must be before its end".to_string(),
            ));
        }
    }
    Ok(())
}

/// Slot storage for professionals. Reservation state only ever changes through
/// conditional updates on the `booked` column, never a read followed by a write.
pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    pub async fn list_slots(&self, professional_id: Uuid, available_only: bool) -> DbResult<Vec<AvailabilitySlot>> {
        let mut path = format!(
            "/rest/v1/availability_slots?professional_id=eq.{}&order=start.asc",
            professional_id
        );
        if available_only {
            path.push_str("&booked=eq.false");
        }

        self.supabase.request(Method::GET, &path, None).await
    }

    /// Earliest unbooked slot with `start <= at <= end`.
    pub async fn find_open_slot(&self, professional_id: Uuid, at: DateTime<Utc>) -> DbResult<Option<AvailabilitySlot>> {
        let instant = format_instant(at);
        let path = format!(
            "/rest/v1/availability_slots?professional_id=eq.{}&booked=eq.false&start=lte.{}&end=gte.{}&order=start.asc&limit=1",
            professional_id, instant, instant
        );

        let slots: Vec<AvailabilitySlot> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(slots.into_iter().next())
    }

    /// Flips `booked` to true only if it is currently false. `None` means the
    /// slot was taken by a concurrent request.
    pub async fn reserve_slot(&self, slot_id: Uuid) -> DbResult<Option<AvailabilitySlot>> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}&booked=eq.false", slot_id);
        let updated: Vec<AvailabilitySlot> = self.supabase
            .request_returning(Method::PATCH, &path, Some(json!({ "booked": true })))
            .await?;

        match updated.into_iter().next() {
            Some(slot) => {
                debug!("Reserved slot {}", slot_id);
                Ok(Some(slot))
            }
            None => {
                warn!("Slot {} was already booked", slot_id);
                Ok(None)
            }
        }
    }

    /// Returns the slot to the open pool. `false` if it was not booked.
    pub async fn release_slot(&self, slot_id: Uuid) -> DbResult<bool> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}&booked=eq.true", slot_id);
        let updated: Vec<Value> = self.supabase
            .request_returning(Method::PATCH, &path, Some(json!({ "booked": false })))
            .await?;

        if updated.is_empty() {
            debug!("Slot {} was not booked, nothing to release", slot_id);
            return Ok(false);
        }

        info!("Released slot {}", slot_id);
        Ok(true)
    }

    /// Replaces the professional's unbooked slots with `slots`. The new rows are
    /// inserted before the old ones are removed, so a failed insert leaves the
    /// previous availability in place. Booked slots are left untouched.
    pub async fn replace_open_slots(
        &self,
        professional_id: Uuid,
        slots: &[SlotInput],
    ) -> Result<Vec<AvailabilitySlot>, ProfessionalError> {
        validate_slots(slots)?;

        let inserted: Vec<AvailabilitySlot> = if slots.is_empty() {
            Vec::new()
        } else {
            let rows: Vec<Value> = slots
                .iter()
                .map(|slot| {
                    json!({
                        "id": Uuid::new_v4(),
                        "professional_id": professional_id,
                        "start": format_instant(slot.start),
                        "end": format_instant(slot.end),
                        "booked": false
                    })
                })
                .collect();

            self.supabase
                .request_returning(Method::POST, "/rest/v1/availability_slots", Some(Value::Array(rows)))
                .await?
        };

        let mut path = format!(
            "/rest/v1/availability_slots?professional_id=eq.{}&booked=eq.false",
            professional_id
        );
        if !inserted.is_empty() {
            let keep: Vec<String> = inserted.iter().map(|slot| slot.id.to_string()).collect();
            path.push_str(&format!("&id=not.in.({})", keep.join(",")));
        }

        if let Err(e) = self.supabase.request::<Value>(Method::DELETE, &path, None).await {
            // A retry of the same replacement converges: it keeps only its own rows
            error!("Stale open slots left for professional {}: {}", professional_id, e);
            return Err(e.into());
        }

        info!("Stored {} open slots for professional {}", inserted.len(), professional_id);
        Ok(inserted)
    }
}
