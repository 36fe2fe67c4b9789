pub mod review;

pub use review::{aggregate_ratings, ReviewService};
