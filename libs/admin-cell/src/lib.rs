pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AdminError, AdminStats, Category};
pub use services::{CategoryService, ModerationService};
