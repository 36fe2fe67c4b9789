pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilitySlot, Professional, ProfessionalError, SearchResult, SortMode};
pub use services::{AvailabilityService, MediaStore, ProfileService, SearchService};
