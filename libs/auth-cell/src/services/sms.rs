use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use shared_config::AppConfig;

use crate::models::AuthError;

/// Outbound text-message channel.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), AuthError>;
}

pub struct TwilioSmsClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSmsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.twilio_base_url.trim_end_matches('/').to_string(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_phone_number.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }
}

#[async_trait]
impl SmsSender for TwilioSmsClient {
    async fn send(&self, to: &str, body: &str) -> Result<(), AuthError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(AuthError::SmsFailed("SMS provider is not configured".to_string()));
        }

        let params = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let response = self.client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Twilio SMS Error: {}", e);
                AuthError::SmsFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Twilio SMS Error ({}): {}", status, text);
            return Err(AuthError::SmsFailed(format!("provider returned {}", status)));
        }

        info!("SMS sent to {}", to);
        Ok(())
    }
}
