use crate::booking::{BookingId, BookingStatus};
use crate::hold::HoldId;
use crate::trip::{SeatId, TripId};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Trip not found: {0}")]
    TripNotFound(TripId),

    #[error("Invalid trip: {0}")]
    InvalidTrip(String),

    #[error("Catalog unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Trip not registered with inventory: {0}")]
    TripNotFound(TripId),

    #[error("Invalid seat selection: {0}")]
    InvalidSeats(String),

    #[error("Seats unavailable on trip {trip_id}: {}", join_seats(.seats))]
    SeatsUnavailable { trip_id: TripId, seats: Vec<SeatId> },

    #[error("Hold not found: {0}")]
    HoldNotFound(HoldId),

    #[error("Hold {0} expired and its seats were taken")]
    HoldExpired(HoldId),

    #[error("Inventory unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for booking {booking_id} from {from} to {to}")]
    InvalidTransition {
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Booking already exists: {0}")]
    DuplicateBooking(BookingId),

    #[error("Could not allocate a unique reference after {0} attempts")]
    ReferenceExhausted(u32),

    #[error("Ledger unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(i64),
}

fn join_seats(seats: &[SeatId]) -> String {
    seats.iter().map(|s| s.0.as_str()).collect::<Vec<_>>().join(", ")
}
