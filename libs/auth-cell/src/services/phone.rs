use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::Rng;
use reqwest::Method;
use serde_json::{json, Map, Value};
use sha2::Sha256;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AuthError, UserRecord};
use crate::services::account::is_valid_phone;
use crate::services::sms::SmsSender;

type HmacSha256 = Hmac<Sha256>;

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn code_mac(secret: &str, user_id: Uuid, code: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(user_id.as_bytes());
    mac.update(b":");
    mac.update(code.as_bytes());
    mac
}

/// Keyed digest of a verification code; only the digest is persisted.
pub fn code_digest(secret: &str, user_id: Uuid, code: &str) -> String {
    URL_SAFE_NO_PAD.encode(code_mac(secret, user_id, code).finalize().into_bytes())
}

pub fn code_matches(secret: &str, user_id: Uuid, code: &str, stored_digest: &str) -> bool {
    match URL_SAFE_NO_PAD.decode(stored_digest) {
        Ok(expected) => code_mac(secret, user_id, code).verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

pub struct PhoneVerificationService<S: SmsSender> {
    supabase: SupabaseClient,
    secret: String,
    sms: S,
}

impl<S: SmsSender> PhoneVerificationService<S> {
    pub fn new(config: &AppConfig, sms: S) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            secret: config.jwt_secret.clone(),
            sms,
        }
    }

    /// Stores a fresh code digest for the user and texts the code to `phone`.
    pub async fn request_code(&self, user: &UserRecord, phone: &str) -> Result<(), AuthError> {
        if !is_valid_phone(phone) {
            return Err(AuthError::InvalidPhone);
        }

        let code = generate_code();
        let mut update = Map::new();

        if user.phone.as_deref() != Some(phone) {
            debug!("User {} changed phone number, resetting verification", user.id);
            update.insert("phone".to_string(), json!(phone));
            update.insert("phone_verified".to_string(), json!(false));
        }
        update.insert(
            "phone_verification_code".to_string(),
            json!(code_digest(&self.secret, user.id, &code)),
        );

        let path = format!("/rest/v1/users?id=eq.{}", user.id);
        let _: Value = self.supabase.request(Method::PATCH, &path, Some(Value::Object(update))).await?;

        let message = format!("Your Dora verification code: {}", code);
        self.sms.send(phone, &message).await?;

        info!("Verification code sent for user {}", user.id);
        Ok(())
    }

    pub async fn verify_code(&self, user: &UserRecord, code: &str) -> Result<(), AuthError> {
        let stored = user.phone_verification_code.as_deref().ok_or(AuthError::InvalidCode)?;

        if !code_matches(&self.secret, user.id, code.trim(), stored) {
            return Err(AuthError::InvalidCode);
        }

        // Guarded on the digest so a code cannot be consumed twice
        let path = format!(
            "/rest/v1/users?id=eq.{}&phone_verification_code=eq.{}",
            user.id,
            urlencoding::encode(stored)
        );
        let updated: Vec<Value> = self.supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(json!({ "phone_verified": true, "phone_verification_code": null })),
            )
            .await?;

        if updated.is_empty() {
            return Err(AuthError::InvalidCode);
        }

        info!("Phone verified for user {}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_have_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_digest_is_bound_to_user_and_code() {
        let user = Uuid::new_v4();
        let digest = code_digest("secret", user, "123456");

        assert!(code_matches("secret", user, "123456", &digest));
        assert!(!code_matches("secret", user, "654321", &digest));
        assert!(!code_matches("secret", Uuid::new_v4(), "123456", &digest));
        assert!(!code_matches("other", user, "123456", &digest));
        assert!(!code_matches("secret", user, "123456", "%%not-base64%%"));
    }
}
