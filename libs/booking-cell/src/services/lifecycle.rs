use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::auth::User;

use crate::models::{Booking, BookingError, BookingStatus};

/// How the caller relates to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingParty {
    Customer,
    Professional,
    Admin,
}

impl BookingParty {
    /// `caller_professional_id` is the caller's own professional profile, if any.
    pub fn of(user: &User, booking: &Booking, caller_professional_id: Option<Uuid>) -> Option<Self> {
        if user.is_admin() {
            Some(BookingParty::Admin)
        } else if caller_professional_id == Some(booking.professional_id) {
            Some(BookingParty::Professional)
        } else if booking.user_id == user.id {
            Some(BookingParty::Customer)
        } else {
            None
        }
    }
}

pub struct BookingLifecycle;

impl BookingLifecycle {
    pub fn valid_transitions(current: BookingStatus) -> &'static [BookingStatus] {
        match current {
            BookingStatus::Pending => &[BookingStatus::Completed, BookingStatus::Cancelled],
            // Terminal states
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    pub fn validate_transition(current: BookingStatus, next: BookingStatus) -> Result<(), BookingError> {
        if !Self::valid_transitions(current).contains(&next) {
            warn!("Invalid booking transition attempted: {} -> {}", current, next);
            return Err(BookingError::InvalidTransition { from: current, to: next });
        }
        Ok(())
    }

    /// Customers may only cancel; the professional and admins may also complete.
    pub fn authorize(party: BookingParty, next: BookingStatus) -> Result<(), BookingError> {
        let allowed = match party {
            BookingParty::Customer => next == BookingStatus::Cancelled,
            BookingParty::Professional | BookingParty::Admin => {
                matches!(next, BookingStatus::Completed | BookingStatus::Cancelled)
            }
        };

        if !allowed {
            debug!("{:?} may not move a booking to {}", party, next);
            return Err(BookingError::Forbidden);
        }
        Ok(())
    }
}
