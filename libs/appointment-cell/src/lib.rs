pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::booking::VisitBookingService;
pub use services::slots::{day_slots, is_date_bookable, is_slot_selectable, slot_roster};
