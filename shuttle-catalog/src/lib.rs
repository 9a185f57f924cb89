pub mod inventory;
pub mod pricing;

pub use inventory::InMemorySeatInventory;
pub use pricing::{FareQuote, PricingConfig, PricingEngine, PricingError};
