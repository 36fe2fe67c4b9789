use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;

pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Why a message was flagged as an attempt to move contact off the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    PhoneNumber,
    Email,
    Url,
    ContactApp,
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagReason::PhoneNumber => write!(f, "phone_number"),
            FlagReason::Email => write!(f, "email"),
            FlagReason::Url => write!(f, "url"),
            FlagReason::ContactApp => write!(f, "contact_app"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub flagged: bool,
    pub flag_reason: Option<FlagReason>,
    pub booking_id: Option<Uuid>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
    pub booking_id: Option<Uuid>,
}

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("{0}")]
    Validation(String),

    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("Cannot send a message to yourself")]
    SelfMessage,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<MessageError> for AppError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::Validation(msg) => AppError::ValidationError(msg),
            MessageError::RecipientNotFound => AppError::NotFound(err.to_string()),
            MessageError::SelfMessage => AppError::BadRequest(err.to_string()),
            MessageError::Database(e) => e.into(),
        }
    }
}
