pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{FlagReason, Message, MessageError};
pub use services::{detect_contact_sharing, MessageService};
