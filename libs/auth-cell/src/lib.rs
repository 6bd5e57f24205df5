pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::PortalState;
pub use services::bootstrap::PortalBootstrapService;
