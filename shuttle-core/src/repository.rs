use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use shuttle_shared::BookingEvent;
use std::collections::BTreeSet;

use crate::booking::{Booking, BookingDraft, BookingId};
use crate::error::{CatalogError, InventoryError, LedgerError};
use crate::hold::{HoldId, SeatHold};
use crate::identity::UserId;
use crate::payment::PaymentRecord;
use crate::search::SeatMap;
use crate::trip::{SeatId, Trip, TripId};

/// Read access to scheduled trips. The booking core never creates or deletes trips.
#[async_trait]
pub trait TripCatalog: Send + Sync {
    async fn get_trip(&self, id: &TripId) -> Result<Option<Trip>, CatalogError>;

    /// Trips on the route departing on `date` (UTC calendar day).
    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Trip>, CatalogError>;

    async fn all_trips(&self) -> Result<Vec<Trip>, CatalogError>;
}

/// Authoritative seat availability per trip.
///
/// Every mutating call is atomic with respect to other calls on the same trip.
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Start tracking a trip. Registering an already tracked trip keeps its live state.
    async fn register_trip(&self, trip: &Trip) -> Result<(), InventoryError>;

    /// Hold all of `seats` for `holder`, or none of them.
    async fn try_hold(
        &self,
        trip_id: &TripId,
        seats: &[SeatId],
        holder: BookingId,
        ttl: Duration,
    ) -> Result<SeatHold, InventoryError>;

    /// Turn a hold into booked seats. Committing an already committed hold is a no-op.
    async fn commit_hold(&self, hold_id: HoldId) -> Result<(), InventoryError>;

    /// Drop a hold, un-booking its seats if it had been committed. Unknown holds are a no-op.
    async fn release_hold(&self, hold_id: HoldId) -> Result<(), InventoryError>;

    /// Return booked seats to availability. Already free seats are a no-op.
    async fn release(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError>;

    /// Mark previously released seats booked again.
    async fn reinstate(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError>;

    async fn available_seats(&self, trip_id: &TripId) -> Result<BTreeSet<SeatId>, InventoryError>;

    async fn seat_map(&self, trip_id: &TripId) -> Result<SeatMap, InventoryError>;

    /// Uncommitted holds whose TTL has passed.
    async fn expired_holds(&self) -> Result<Vec<SeatHold>, InventoryError>;
}

/// Booking records keyed by id and by reference.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Persist a pending booking and assign its reference.
    async fn create(&self, draft: BookingDraft) -> Result<Booking, LedgerError>;

    /// Pending -> Confirmed, recording the payment.
    async fn finalize(&self, id: BookingId, payment: PaymentRecord) -> Result<Booking, LedgerError>;

    /// Pending -> Expired.
    async fn mark_expired(&self, id: BookingId) -> Result<Booking, LedgerError>;

    /// Confirmed -> Cancelled.
    async fn cancel(&self, id: BookingId) -> Result<Booking, LedgerError>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, LedgerError>;

    async fn get_by_reference(&self, reference: &str) -> Result<Booking, LedgerError>;

    /// Newest first.
    async fn list_by_user(&self, user: &UserId) -> Result<Vec<Booking>, LedgerError>;
}

/// Fire-and-forget sink for booking lifecycle events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: BookingEvent);
}
