pub mod booking;
pub mod lifecycle;
pub mod slots;

pub use booking::VisitBookingService;
pub use lifecycle::AppointmentLifecycleService;
