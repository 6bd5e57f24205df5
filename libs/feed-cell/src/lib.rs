pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::feed::FeedService;
pub use services::state::FeedState;
pub use services::stream::RealtimeHub;
