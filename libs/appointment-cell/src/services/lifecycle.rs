use tracing::{debug, warn};

use crate::models::{AppointmentStatus, BookingError};

/// Status rules for an appointment record.
///
/// `pending` awaits vet review; `accepted`/`rejected` are the vet's call;
/// `completed` is set by the owner once the visit time has passed. Any
/// reschedule routes back through `pending` since the new time needs
/// re-approval.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {:?} to {:?}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {:?} -> {:?}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition(current_status));
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Accepted,
                AppointmentStatus::Rejected,
                AppointmentStatus::Completed,
                // A reschedule of a still-pending record stays pending.
                AppointmentStatus::Pending,
            ],
            AppointmentStatus::Accepted => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Pending,
            ],
            // A rejected visit can be rebooked at a new time.
            AppointmentStatus::Rejected => vec![
                AppointmentStatus::Pending,
            ],
            // Terminal
            AppointmentStatus::Completed => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
