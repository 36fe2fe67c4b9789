use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use professional_cell::models::Professional;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AdminError, AdminStats, FlaggedMessage};

const TOGGLE_ATTEMPTS: u32 = 3;

pub struct ModerationService {
    supabase: SupabaseClient,
}

impl ModerationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn get_professional(&self, professional_id: Uuid) -> Result<Professional, AdminError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Professional> = self.supabase.request(Method::GET, &path, None).await?;
        result.into_iter().next().ok_or(AdminError::ProfessionalNotFound)
    }

    /// Flips `is_premium`. The write is conditional on the value just read so
    /// two concurrent toggles cannot collapse into one.
    pub async fn toggle_premium(&self, professional_id: Uuid) -> Result<bool, AdminError> {
        for attempt in 1..=TOGGLE_ATTEMPTS {
            let current = self.get_professional(professional_id).await?.is_premium;

            let path = format!(
                "/rest/v1/professionals?id=eq.{}&is_premium=eq.{}",
                professional_id, current
            );
            let updated: Vec<Value> = self.supabase
                .request_returning(Method::PATCH, &path, Some(json!({ "is_premium": !current })))
                .await?;

            if !updated.is_empty() {
                info!("Professional {} premium set to {}", professional_id, !current);
                return Ok(!current);
            }

            warn!(
                "Premium toggle for {} raced (attempt {}/{})",
                professional_id, attempt, TOGGLE_ATTEMPTS
            );
        }

        Err(AdminError::Contended)
    }

    pub async fn verify_id(&self, professional_id: Uuid) -> Result<bool, AdminError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let updated: Vec<Professional> = self.supabase
            .request_returning(Method::PATCH, &path, Some(json!({ "id_verified": true })))
            .await?;

        let professional = updated.into_iter().next().ok_or(AdminError::ProfessionalNotFound)?;
        info!("Professional {} ID verified", professional.id);
        Ok(professional.id_verified)
    }

    pub async fn flagged_messages(&self) -> Result<Vec<FlaggedMessage>, AdminError> {
        let path = "/rest/v1/messages?flagged=eq.true\
            &select=*,sender:users!sender_id(name,email),recipient:users!recipient_id(name,email)\
            &order=created_at.desc";
        let messages: Vec<FlaggedMessage> = self.supabase.request(Method::GET, path, None).await?;

        debug!("{} flagged messages pending review", messages.len());
        Ok(messages)
    }

    async fn count(&self, path: &str) -> Result<usize, AdminError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        Ok(rows.len())
    }

    pub async fn stats(&self) -> Result<AdminStats, AdminError> {
        let (professionals, flagged_messages, premium) = tokio::try_join!(
            self.count("/rest/v1/professionals?select=id"),
            self.count("/rest/v1/messages?flagged=eq.true&select=id"),
            self.count("/rest/v1/professionals?is_premium=eq.true&select=id"),
        )?;

        Ok(AdminStats {
            professionals,
            flagged_messages,
            premium,
        })
    }
}
