pub mod booking;
pub mod clock;
pub mod error;
pub mod hold;
pub mod identity;
pub mod payment;
pub mod repository;
pub mod search;
pub mod trip;

pub use booking::{Booking, BookingDraft, BookingId, BookingReference, BookingStatus, PassengerDetails};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CatalogError, InventoryError, LedgerError, PaymentError};
pub use hold::{HoldId, SeatHold};
pub use identity::UserId;
pub use payment::{PaymentEvent, PaymentLink, PaymentProvider, PaymentRecord, PaymentStatus};
pub use repository::{BookingLedger, EventPublisher, SeatInventory, TripCatalog};
pub use search::{SeatMap, SeatMapEntry, SeatState, TripOption, TripSearchRequest};
pub use trip::{SeatId, Trip, TripId, TripSummary};
