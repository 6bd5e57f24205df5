pub mod feed;
pub mod state;
pub mod stream;

pub use feed::FeedService;
pub use state::FeedState;
pub use stream::RealtimeHub;
