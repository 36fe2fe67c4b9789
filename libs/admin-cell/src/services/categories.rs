use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AdminError, Category};

pub struct CategoryService {
    supabase: SupabaseClient,
}

impl CategoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, AdminError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AdminError::Validation("Category name is required".to_string()));
        }

        let path = format!("/rest/v1/categories?name=eq.{}", urlencoding::encode(name));
        let existing: Vec<Category> = self.supabase.request(Method::GET, &path, None).await?;
        if !existing.is_empty() {
            return Err(AdminError::CategoryExists);
        }

        let created: Vec<Category> = self.supabase
            .request_returning(
                Method::POST,
                "/rest/v1/categories",
                Some(json!({
                    "id": Uuid::new_v4(),
                    "name": name,
                    "created_at": Utc::now().to_rfc3339()
                })),
            )
            .await
            .map_err(|e| if e.is_conflict() { AdminError::CategoryExists } else { e.into() })?;

        let category = created.into_iter().next().ok_or(AdminError::CategoryExists)?;
        info!("Category {} created", category.name);
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AdminError> {
        let categories: Vec<Category> = self.supabase
            .request(Method::GET, "/rest/v1/categories?order=name.asc", None)
            .await?;
        Ok(categories)
    }
}
