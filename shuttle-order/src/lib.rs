pub mod callbacks;
pub mod ledger;
pub mod locks;
pub mod manager;
pub mod orchestrator;
pub mod query;
pub mod reference;

pub use callbacks::{CallbackOutcome, PaymentCallbackHandler};
pub use ledger::InMemoryBookingLedger;
pub use locks::TripLocks;
pub use manager::{ReservationError, ReservationManager, ReserveRequest};
pub use orchestrator::{MockPaymentProvider, PaymentOrchestrator};
pub use query::{QueryError, QueryService};
pub use reference::{RandomReferenceGenerator, ReferenceGenerator};
