use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::ProfessionalError;

/// Object storage for portfolio photos and identity documents.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `bytes` under `path` and returns a publicly reachable URL.
    async fn store(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ProfessionalError>;
}

pub struct SupabaseMediaStore {
    supabase: SupabaseClient,
    bucket: String,
}

impl SupabaseMediaStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.storage_bucket.clone(),
        }
    }
}

#[async_trait]
impl MediaStore for SupabaseMediaStore {
    async fn store(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, ProfessionalError> {
        debug!("Storing {} ({} bytes) in bucket {}", path, bytes.len(), self.bucket);

        self.supabase
            .upload_object(&self.bucket, path, bytes, content_type)
            .await
            .map_err(|e| ProfessionalError::Upload(e.to_string()))
    }
}

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("application/pdf", "pdf"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMedia {
    pub content_type: String,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Decodes a `data:<mime>;base64,<payload>` URL. Bare base64 is taken as JPEG.
pub fn decode_data_url(input: &str) -> Result<DecodedMedia, ProfessionalError> {
    let input = input.trim();

    let (content_type, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| ProfessionalError::InvalidMedia("malformed data URL".to_string()))?;
            let content_type = meta
                .strip_suffix(";base64")
                .ok_or_else(|| ProfessionalError::InvalidMedia("data URL must be base64 encoded".to_string()))?;
            (content_type.to_ascii_lowercase(), payload)
        }
        None => ("image/jpeg".to_string(), input),
    };

    let extension = ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| ProfessionalError::InvalidMedia(format!("unsupported content type {}", content_type)))?;

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| ProfessionalError::InvalidMedia("payload is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(ProfessionalError::InvalidMedia("empty file".to_string()));
    }

    Ok(DecodedMedia {
        content_type,
        extension,
        bytes,
    })
}
