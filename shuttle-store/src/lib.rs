pub mod app_config;
pub mod events;
pub mod trip_repo;

pub use app_config::Config;
pub use events::BroadcastEventPublisher;
pub use trip_repo::InMemoryTripCatalog;
