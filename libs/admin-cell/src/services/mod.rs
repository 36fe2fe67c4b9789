pub mod categories;
pub mod moderation;

pub use categories::CategoryService;
pub use moderation::ModerationService;
