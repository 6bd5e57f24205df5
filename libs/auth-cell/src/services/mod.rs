pub mod bootstrap;

pub use bootstrap::PortalBootstrapService;
