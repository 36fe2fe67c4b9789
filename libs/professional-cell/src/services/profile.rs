use chrono::Utc;
use futures::future::try_join_all;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::user::USER_SUMMARY_COLUMNS;

use crate::models::{
    Professional, ProfessionalError, ProfessionalWithUser, ProfileResponse, UpsertProfileRequest,
    MAX_DESCRIPTION_LENGTH, MAX_PHOTOS_PER_UPLOAD,
};
use crate::services::availability::{validate_slots, AvailabilityService};
use crate::services::media::{decode_data_url, MediaStore};

const PORTFOLIO_APPEND_ATTEMPTS: u32 = 3;

/// Postgres array literal for a PostgREST `eq` filter on a text[] column.
fn array_literal(items: &[String]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|item| format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", quoted.join(","))
}

/// Trims service names and drops blanks and duplicates, keeping first-seen order.
pub fn normalize_services(services: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(services.len());
    for service in services {
        let service = service.trim();
        if !service.is_empty() && !normalized.iter().any(|s| s == service) {
            normalized.push(service.to_string());
        }
    }
    normalized
}

fn validate_request(request: &UpsertProfileRequest) -> Result<(), ProfessionalError> {
    if let Some(ref services) = request.services {
        if normalize_services(services).is_empty() {
            return Err(ProfessionalError::Validation("At least one service is required".to_string()));
        }
    }
    if let Some(ref description) = request.description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ProfessionalError::Validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
    }
    if let Some(rate) = request.hourly_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ProfessionalError::Validation("Hourly rate cannot be negative".to_string()));
        }
    }
    if let Some(years) = request.experience_years {
        if years < 0 {
            return Err(ProfessionalError::Validation("Experience years cannot be negative".to_string()));
        }
    }
    if let Some(ref photos) = request.photos {
        if photos.len() > MAX_PHOTOS_PER_UPLOAD {
            return Err(ProfessionalError::Validation(format!(
                "At most {} photos per upload",
                MAX_PHOTOS_PER_UPLOAD
            )));
        }
    }
    if let Some(ref slots) = request.availability {
        validate_slots(slots)?;
    }
    Ok(())
}

pub struct ProfileService<M: MediaStore> {
    supabase: SupabaseClient,
    availability: AvailabilityService,
    media: M,
}

impl<M: MediaStore> ProfileService<M> {
    pub fn new(config: &AppConfig, media: M) -> Self {
        let supabase = SupabaseClient::new(config);
        Self {
            availability: AvailabilityService::with_client(supabase.clone()),
            supabase,
            media,
        }
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Professional>, ProfessionalError> {
        let path = format!("/rest/v1/professionals?user_id=eq.{}", user_id);
        let result: Vec<Professional> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    pub async fn get_professional(&self, professional_id: Uuid) -> Result<Professional, ProfessionalError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Professional> = self.supabase.request(Method::GET, &path, None).await?;
        result.into_iter().next().ok_or(ProfessionalError::NotFound)
    }

    /// Profile with the owner's user summary and every slot, earliest first.
    pub async fn get_profile(&self, professional_id: Uuid) -> Result<ProfileResponse, ProfessionalError> {
        debug!("Fetching professional profile: {}", professional_id);

        let path = format!(
            "/rest/v1/professionals?id=eq.{}&select=*,user:users({})",
            professional_id, USER_SUMMARY_COLUMNS
        );
        let result: Vec<ProfessionalWithUser> = self.supabase.request(Method::GET, &path, None).await?;
        let found = result.into_iter().next().ok_or(ProfessionalError::NotFound)?;

        let availability = self.availability.list_slots(professional_id, false).await?;

        Ok(ProfileResponse {
            professional: found.professional,
            user: found.user,
            availability,
        })
    }

    /// Creates the caller's professional profile, or updates the fields present
    /// in `request` when one already exists.
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        request: UpsertProfileRequest,
    ) -> Result<ProfileResponse, ProfessionalError> {
        validate_request(&request)?;

        let existing = self.find_by_user(user_id).await?;
        if existing.is_none() && request.services.is_none() {
            return Err(ProfessionalError::Validation("At least one service is required".to_string()));
        }

        let uploaded = match request.photos {
            Some(ref photos) if !photos.is_empty() => {
                try_join_all(photos.iter().map(|photo| self.store_media(user_id, "photos", photo))).await?
            }
            _ => Vec::new(),
        };

        let mut fields = Map::new();
        if let Some(ref services) = request.services {
            fields.insert("services".to_string(), json!(normalize_services(services)));
        }
        if let Some(ref description) = request.description {
            fields.insert("description".to_string(), json!(description.trim()));
        }
        if let Some(rate) = request.hourly_rate {
            fields.insert("hourly_rate".to_string(), json!(rate));
        }
        if let Some(years) = request.experience_years {
            fields.insert("experience_years".to_string(), json!(years));
        }
        if let Some(ref document) = request.id_document {
            let url = if document.trim_start().starts_with("data:") {
                self.store_media(user_id, "id", document).await?
            } else if document.starts_with("http://") || document.starts_with("https://") {
                document.clone()
            } else {
                return Err(ProfessionalError::InvalidMedia("ID document must be a URL or data URL".to_string()));
            };
            fields.insert("id_document".to_string(), json!(url));
            fields.insert("id_verified".to_string(), json!(false));
        }

        let professional_id = match existing {
            Some(current) => {
                // Slots go first so a failed replacement leaves the profile untouched
                if let Some(ref slots) = request.availability {
                    self.availability.replace_open_slots(current.id, slots).await?;
                }
                let professional = self.update(current, fields).await?;
                professional.id
            }
            None => {
                let professional = self.create(user_id, fields).await?;
                if let Some(ref slots) = request.availability {
                    self.availability.replace_open_slots(professional.id, slots).await?;
                }
                professional.id
            }
        };

        if !uploaded.is_empty() {
            self.append_portfolio(professional_id, &uploaded).await?;
        }

        self.get_profile(professional_id).await
    }

    /// Appends `urls` to the stored portfolio. The write is conditional on the
    /// array just read, so concurrent uploads cannot drop each other's photos.
    async fn append_portfolio(&self, professional_id: Uuid, urls: &[String]) -> Result<(), ProfessionalError> {
        for attempt in 1..=PORTFOLIO_APPEND_ATTEMPTS {
            let current = self.get_professional(professional_id).await?.portfolio;

            let mut portfolio = current.clone();
            portfolio.extend(urls.iter().cloned());

            let path = format!(
                "/rest/v1/professionals?id=eq.{}&portfolio=eq.{}",
                professional_id,
                urlencoding::encode(&array_literal(&current))
            );
            let updated: Vec<Value> = self.supabase
                .request_returning(Method::PATCH, &path, Some(json!({ "portfolio": portfolio })))
                .await?;

            if !updated.is_empty() {
                info!("Added {} photos to professional {}", urls.len(), professional_id);
                return Ok(());
            }

            warn!(
                "Portfolio of {} changed concurrently (attempt {}/{})",
                professional_id, attempt, PORTFOLIO_APPEND_ATTEMPTS
            );
        }

        Err(ProfessionalError::Contended)
    }

    async fn create(&self, user_id: Uuid, fields: Map<String, Value>) -> Result<Professional, ProfessionalError> {
        let mut row = fields.clone();
        row.insert("id".to_string(), json!(Uuid::new_v4()));
        row.insert("user_id".to_string(), json!(user_id));
        row.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        row.insert("portfolio".to_string(), json!([]));
        row.entry("hourly_rate").or_insert_with(|| json!(0.0));
        row.entry("experience_years").or_insert_with(|| json!(0));

        let created: Vec<Professional> = match self.supabase
            .request_returning(Method::POST, "/rest/v1/professionals", Some(Value::Object(row)))
            .await
        {
            Ok(rows) => rows,
            Err(e) if e.is_conflict() => {
                // Another request created the profile first; apply only our fields on top of it
                debug!("Profile for user {} created concurrently, updating instead", user_id);
                let path = format!("/rest/v1/professionals?user_id=eq.{}", user_id);
                self.supabase
                    .request_returning(Method::PATCH, &path, Some(Value::Object(fields)))
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        let professional = created.into_iter().next().ok_or(ProfessionalError::NotFound)?;
        info!("Professional profile {} created for user {}", professional.id, user_id);
        Ok(professional)
    }

    async fn update(&self, current: Professional, fields: Map<String, Value>) -> Result<Professional, ProfessionalError> {
        if fields.is_empty() {
            return Ok(current);
        }

        let path = format!("/rest/v1/professionals?id=eq.{}", current.id);
        let updated: Vec<Professional> = self.supabase
            .request_returning(Method::PATCH, &path, Some(Value::Object(fields)))
            .await?;

        let professional = updated.into_iter().next().ok_or(ProfessionalError::NotFound)?;
        info!("Professional profile {} updated", professional.id);
        Ok(professional)
    }

    async fn store_media(&self, user_id: Uuid, folder: &str, encoded: &str) -> Result<String, ProfessionalError> {
        let media = decode_data_url(encoded)?;
        let path = format!("{}/{}/{}.{}", user_id, folder, Uuid::new_v4(), media.extension);
        self.media.store(&path, media.bytes, &media.content_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_services() {
        let raw = vec![" plumbing ".to_string(), "".to_string(), "plumbing".to_string(), "tiling".to_string()];
        assert_eq!(normalize_services(&raw), vec!["plumbing", "tiling"]);
        assert!(normalize_services(&["  ".to_string()]).is_empty());
    }

    #[test]
    fn test_array_literal() {
        assert_eq!(array_literal(&[]), "{}");
        assert_eq!(
            array_literal(&["https://cdn/a.png".to_string(), "b,\"c".to_string()]),
            "{\"https://cdn/a.png\",\"b,\\\"c\"}"
        );
    }

    #[test]
    fn test_request_validation() {
        let ok = UpsertProfileRequest {
            services: Some(vec!["plumbing".to_string()]),
            hourly_rate: Some(0.0),
            ..Default::default()
        };
        assert!(validate_request(&ok).is_ok());

        let long = UpsertProfileRequest {
            description: Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1)),
            ..Default::default()
        };
        assert!(validate_request(&long).is_err());

        let negative = UpsertProfileRequest {
            hourly_rate: Some(-5.0),
            ..Default::default()
        };
        assert!(validate_request(&negative).is_err());

        let photos = UpsertProfileRequest {
            photos: Some(vec!["a".to_string(); MAX_PHOTOS_PER_UPLOAD + 1]),
            ..Default::default()
        };
        assert!(validate_request(&photos).is_err());
    }
}
