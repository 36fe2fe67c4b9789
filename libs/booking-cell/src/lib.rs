pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Booking, BookingError, BookingStatus};
pub use services::BookingService;
