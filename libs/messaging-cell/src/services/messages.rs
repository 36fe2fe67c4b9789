use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Message, MessageError, SendMessageRequest, MAX_MESSAGE_LENGTH};
use crate::services::flagging::detect_contact_sharing;

pub struct MessageService {
    supabase: SupabaseClient,
}

impl MessageService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn send_message(&self, sender_id: Uuid, request: SendMessageRequest) -> Result<Message, MessageError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(MessageError::Validation("Message content is required".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(MessageError::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }
        if request.recipient_id == sender_id {
            return Err(MessageError::SelfMessage);
        }

        let recipient_path = format!("/rest/v1/users?id=eq.{}&select=id", request.recipient_id);
        let recipients: Vec<Value> = self.supabase.request(Method::GET, &recipient_path, None).await?;
        if recipients.is_empty() {
            return Err(MessageError::RecipientNotFound);
        }

        let flag_reason = detect_contact_sharing(content);
        if let Some(reason) = flag_reason {
            warn!("Message from {} to {} flagged: {}", sender_id, request.recipient_id, reason);
        }

        let message_data = json!({
            "id": Uuid::new_v4(),
            "sender_id": sender_id,
            "recipient_id": request.recipient_id,
            "content": content,
            "flagged": flag_reason.is_some(),
            "flag_reason": flag_reason,
            "booking_id": request.booking_id,
            "read": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let created: Vec<Message> = self.supabase
            .request_returning(Method::POST, "/rest/v1/messages", Some(message_data))
            .await?;

        let message = created
            .into_iter()
            .next()
            .ok_or_else(|| MessageError::Validation("Failed to send message".to_string()))?;

        debug!("Message {} sent", message.id);
        Ok(message)
    }

    /// Both directions of the conversation, oldest first. Messages the caller
    /// received are marked read.
    pub async fn get_conversation(&self, user_id: Uuid, other_id: Uuid) -> Result<Vec<Message>, MessageError> {
        let path = format!(
            "/rest/v1/messages?or=(and(sender_id.eq.{a},recipient_id.eq.{b}),and(sender_id.eq.{b},recipient_id.eq.{a}))&order=created_at.asc",
            a = user_id,
            b = other_id
        );
        let mut messages: Vec<Message> = self.supabase.request(Method::GET, &path, None).await?;

        let has_unread = messages.iter().any(|m| m.recipient_id == user_id && !m.read);
        if has_unread {
            let read_path = format!(
                "/rest/v1/messages?sender_id=eq.{}&recipient_id=eq.{}&read=eq.false",
                other_id, user_id
            );
            let _: Value = self.supabase
                .request(Method::PATCH, &read_path, Some(json!({ "read": true })))
                .await?;

            for message in messages.iter_mut().filter(|m| m.recipient_id == user_id) {
                message.read = true;
            }
            info!("Marked conversation from {} as read for {}", other_id, user_id);
        }

        Ok(messages)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<usize, MessageError> {
        let path = format!("/rest/v1/messages?recipient_id=eq.{}&read=eq.false&select=id", user_id);
        let unread: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(unread.len())
    }
}
