use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use booking_cell::models::Booking;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    CreateReviewRequest, RatingSummary, Review, ReviewError, ReviewWithAuthor, MAX_RATING, MIN_RATING,
};

#[derive(Debug, Deserialize)]
struct RatingRow {
    rating: i32,
}

/// Mean and count over every rating of a professional. No reviews gives zero.
pub fn aggregate_ratings(ratings: &[i32]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary { avg_rating: 0.0, total_reviews: 0 };
    }

    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    RatingSummary {
        avg_rating: sum as f64 / ratings.len() as f64,
        total_reviews: ratings.len() as i64,
    }
}

pub struct ReviewService {
    supabase: SupabaseClient,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_review(&self, user_id: Uuid, request: CreateReviewRequest) -> Result<Review, ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(ReviewError::InvalidRating);
        }

        let booking_path = format!(
            "/rest/v1/bookings?id=eq.{}&user_id=eq.{}&professional_id=eq.{}&status=eq.completed",
            request.booking_id, user_id, request.professional_id
        );
        let bookings: Vec<Booking> = self.supabase.request(Method::GET, &booking_path, None).await?;
        if bookings.is_empty() {
            debug!("Booking {} is not a completed booking of user {}", request.booking_id, user_id);
            return Err(ReviewError::BookingNotCompleted);
        }

        let existing_path = format!("/rest/v1/reviews?booking_id=eq.{}&select=id", request.booking_id);
        let existing: Vec<Value> = self.supabase.request(Method::GET, &existing_path, None).await?;
        if !existing.is_empty() {
            return Err(ReviewError::AlreadyReviewed);
        }

        let review_data = json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "professional_id": request.professional_id,
            "booking_id": request.booking_id,
            "rating": request.rating,
            "comment": request.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            "created_at": Utc::now().to_rfc3339()
        });

        // booking_id is unique in the store, so a concurrent duplicate surfaces as a conflict
        let created: Vec<Review> = self.supabase
            .request_returning(Method::POST, "/rest/v1/reviews", Some(review_data))
            .await
            .map_err(|e| if e.is_conflict() { ReviewError::AlreadyReviewed } else { e.into() })?;

        let review = created.into_iter().next().ok_or(ReviewError::AlreadyReviewed)?;
        info!("Review {} created for professional {}", review.id, review.professional_id);

        if let Err(first) = self.recompute_rating(review.professional_id).await {
            warn!("Rating recompute failed, retrying: {}", first);
            if let Err(second) = self.recompute_rating(review.professional_id).await {
                error!("Rating for professional {} left stale: {}", review.professional_id, second);
            }
        }

        Ok(review)
    }

    /// Rewrites the professional's aggregate from the full review set. Safe to
    /// repeat: every run writes the same absolute values.
    pub async fn recompute_rating(&self, professional_id: Uuid) -> Result<RatingSummary, ReviewError> {
        let path = format!("/rest/v1/reviews?professional_id=eq.{}&select=rating", professional_id);
        let rows: Vec<RatingRow> = self.supabase.request(Method::GET, &path, None).await?;

        let ratings: Vec<i32> = rows.into_iter().map(|r| r.rating).collect();
        let summary = aggregate_ratings(&ratings);

        let update_path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let _: Value = self.supabase
            .request(Method::PATCH, &update_path, Some(json!(summary)))
            .await?;

        debug!(
            "Professional {} rating now {:.2} over {} reviews",
            professional_id, summary.avg_rating, summary.total_reviews
        );
        Ok(summary)
    }

    pub async fn list_for_professional(&self, professional_id: Uuid) -> Result<Vec<ReviewWithAuthor>, ReviewError> {
        let path = format!(
            "/rest/v1/reviews?professional_id=eq.{}&select=*,user:users(id,name)&order=created_at.desc",
            professional_id
        );
        let reviews: Vec<ReviewWithAuthor> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(reviews)
    }
}
