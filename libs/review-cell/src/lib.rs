pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Review, ReviewError};
pub use services::ReviewService;
