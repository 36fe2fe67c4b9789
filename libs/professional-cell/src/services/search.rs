use std::cmp::Ordering;

use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::Role;
use shared_models::user::{GeoPoint, USER_SUMMARY_COLUMNS};

use crate::models::{ProfessionalError, ProfessionalWithUser, SearchQuery, SearchResult, SortMode};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub service: Option<String>,
    pub origin: Option<GeoPoint>,
    pub max_distance_km: f64,
    pub min_rating: f64,
    pub sort: SortMode,
    pub limit: Option<usize>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            service: None,
            origin: None,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            min_rating: 0.0,
            sort: SortMode::default(),
            limit: None,
        }
    }
}

impl SearchCriteria {
    pub fn from_query(query: SearchQuery) -> Result<Self, ProfessionalError> {
        let origin = match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoPoint::new(lat, lng);
                if !point.is_valid() {
                    return Err(ProfessionalError::Validation("Latitude and longitude out of range".to_string()));
                }
                Some(point)
            }
            (None, None) => None,
            _ => {
                return Err(ProfessionalError::Validation(
                    "Latitude and longitude must be provided together".to_string(),
                ))
            }
        };

        let max_distance_km = query.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_KM);
        if !max_distance_km.is_finite() || max_distance_km < 0.0 {
            return Err(ProfessionalError::Validation("max_distance must be a positive number".to_string()));
        }

        let min_rating = query.min_rating.unwrap_or(0.0);
        if !(0.0..=5.0).contains(&min_rating) {
            return Err(ProfessionalError::Validation("min_rating must be between 0 and 5".to_string()));
        }

        let service = query
            .service
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            service,
            origin,
            max_distance_km,
            min_rating,
            sort: SortMode::from_param(query.sort.as_deref()),
            limit: query.limit,
        })
    }
}

fn by_distance(a: &SearchResult, b: &SearchResult) -> Ordering {
    match (a.distance, b.distance) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_rating_desc(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.professional.avg_rating.total_cmp(&a.professional.avg_rating)
}

/// Filters and orders candidates in process. Sorting is stable, so candidates
/// that compare equal keep the order the store returned them in.
pub fn rank(candidates: Vec<ProfessionalWithUser>, criteria: &SearchCriteria) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let user = candidate.user?;
            if user.role != Some(Role::Professional) {
                return None;
            }

            let professional = candidate.professional;
            if professional.avg_rating < criteria.min_rating {
                return None;
            }
            if let Some(ref service) = criteria.service {
                if !professional.services.iter().any(|s| s == service) {
                    return None;
                }
            }

            let distance = match criteria.origin {
                Some(origin) => {
                    let km = haversine_km(origin, user.location()?);
                    if km > criteria.max_distance_km {
                        return None;
                    }
                    Some(round_tenth(km))
                }
                None => None,
            };

            Some(SearchResult { professional, user, distance })
        })
        .collect();

    match criteria.sort {
        SortMode::Distance => results.sort_by(by_distance),
        SortMode::Rating => results.sort_by(by_rating_desc),
        SortMode::Premium => results.sort_by(|a, b| {
            b.professional
                .is_premium
                .cmp(&a.professional.is_premium)
                .then_with(|| by_rating_desc(a, b))
                .then_with(|| by_distance(a, b))
        }),
    }

    if let Some(limit) = criteria.limit {
        results.truncate(limit);
    }

    results
}

pub struct SearchService {
    supabase: SupabaseClient,
}

impl SearchService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<SearchResult>, ProfessionalError> {
        debug!("Searching professionals: {:?}", criteria);

        let mut path = format!(
            "/rest/v1/professionals?select=*,user:users!inner({})&user.role=eq.professional",
            USER_SUMMARY_COLUMNS
        );
        if let Some(ref service) = criteria.service {
            let contains = format!("{{\"{}\"}}", service.replace('"', ""));
            path.push_str(&format!("&services=cs.{}", urlencoding::encode(&contains)));
        }
        if criteria.min_rating > 0.0 {
            path.push_str(&format!("&avg_rating=gte.{}", criteria.min_rating));
        }
        path.push_str("&order=created_at.asc");

        let candidates: Vec<ProfessionalWithUser> = self.supabase.request(Method::GET, &path, None).await?;
        let total = candidates.len();
        let ranked = rank(candidates, criteria);

        debug!("Search matched {} of {} candidates", ranked.len(), total);
        Ok(ranked)
    }
}
