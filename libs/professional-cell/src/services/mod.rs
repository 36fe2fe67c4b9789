pub mod availability;
pub mod media;
pub mod profile;
pub mod search;

pub use availability::AvailabilityService;
pub use media::{MediaStore, SupabaseMediaStore};
pub use profile::ProfileService;
pub use search::{SearchCriteria, SearchService};
