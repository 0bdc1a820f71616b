// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{BookingError, BookingStatus};

pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &BookingStatus,
        new_status: &BookingStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {:?} to {:?}", current_status, new_status);

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!("Invalid status transition attempted: {:?} -> {:?}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition(current_status.clone()));
        }

        Ok(())
    }

    /// All valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Pending => vec![
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Confirmed => vec![
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
            BookingStatus::NoShow => vec![],
        }
    }
}

impl Default for BookingLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_confirmed_or_cancelled() {
        let lifecycle = BookingLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Pending, &BookingStatus::Confirmed)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Pending, &BookingStatus::Cancelled)
            .is_ok());
        assert!(lifecycle
            .validate_status_transition(&BookingStatus::Pending, &BookingStatus::Completed)
            .is_err());
    }

    #[test]
    fn confirmed_can_conclude_three_ways() {
        let lifecycle = BookingLifecycleService::new();
        for next in [
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            assert!(lifecycle
                .validate_status_transition(&BookingStatus::Confirmed, &next)
                .is_ok());
        }
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        let lifecycle = BookingLifecycleService::new();
        for terminal in [
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            for next in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
                BookingStatus::NoShow,
            ] {
                let result = lifecycle.validate_status_transition(&terminal, &next);
                assert!(
                    matches!(result, Err(BookingError::InvalidStatusTransition(_))),
                    "{} -> {} should be rejected",
                    terminal,
                    next
                );
            }
        }
    }
}
