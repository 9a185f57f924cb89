#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use shuttle_catalog::{InMemorySeatInventory, PricingEngine};
use shuttle_core::{
    Booking, BookingDraft, BookingId, BookingLedger, HoldId, InventoryError, LedgerError,
    ManualClock, PassengerDetails, PaymentRecord, PaymentStatus, SeatHold, SeatId, SeatInventory,
    SeatMap, Trip, TripId, UserId,
};
use shuttle_order::{
    InMemoryBookingLedger, QueryService, RandomReferenceGenerator, ReservationManager, ReserveRequest,
};
use shuttle_shared::{BookingEvent, Masked};
use shuttle_store::{BroadcastEventPublisher, InMemoryTripCatalog};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const FARE: i64 = 2550;

/// Ledger wrapper whose writes can be made to fail on demand.
pub struct FlakyLedger {
    inner: InMemoryBookingLedger,
    pub fail_create: AtomicBool,
    pub fail_finalize: AtomicBool,
    pub fail_cancel: AtomicBool,
}

fn outage() -> LedgerError {
    LedgerError::Storage("ledger unavailable".to_string())
}

#[async_trait]
impl BookingLedger for FlakyLedger {
    async fn create(&self, draft: BookingDraft) -> Result<Booking, LedgerError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.create(draft).await
    }

    async fn finalize(&self, id: BookingId, payment: PaymentRecord) -> Result<Booking, LedgerError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.finalize(id, payment).await
    }

    async fn mark_expired(&self, id: BookingId) -> Result<Booking, LedgerError> {
        self.inner.mark_expired(id).await
    }

    async fn cancel(&self, id: BookingId) -> Result<Booking, LedgerError> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.cancel(id).await
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, LedgerError> {
        self.inner.get(id).await
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Booking, LedgerError> {
        self.inner.get_by_reference(reference).await
    }

    async fn list_by_user(&self, user: &UserId) -> Result<Vec<Booking>, LedgerError> {
        self.inner.list_by_user(user).await
    }
}

/// Inventory wrapper whose compensating calls can be made to fail.
pub struct FlakyInventory {
    inner: InMemorySeatInventory,
    pub fail_release_hold: AtomicBool,
    pub fail_reinstate: AtomicBool,
}

fn inventory_outage() -> InventoryError {
    InventoryError::Storage("inventory unavailable".to_string())
}

#[async_trait]
impl SeatInventory for FlakyInventory {
    async fn register_trip(&self, trip: &Trip) -> Result<(), InventoryError> {
        self.inner.register_trip(trip).await
    }

    async fn try_hold(
        &self,
        trip_id: &TripId,
        seats: &[SeatId],
        holder: BookingId,
        ttl: Duration,
    ) -> Result<SeatHold, InventoryError> {
        self.inner.try_hold(trip_id, seats, holder, ttl).await
    }

    async fn commit_hold(&self, hold_id: HoldId) -> Result<(), InventoryError> {
        self.inner.commit_hold(hold_id).await
    }

    async fn release_hold(&self, hold_id: HoldId) -> Result<(), InventoryError> {
        if self.fail_release_hold.load(Ordering::SeqCst) {
            return Err(inventory_outage());
        }
        self.inner.release_hold(hold_id).await
    }

    async fn release(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError> {
        self.inner.release(trip_id, seats).await
    }

    async fn reinstate(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError> {
        if self.fail_reinstate.load(Ordering::SeqCst) {
            return Err(inventory_outage());
        }
        self.inner.reinstate(trip_id, seats).await
    }

    async fn available_seats(&self, trip_id: &TripId) -> Result<BTreeSet<SeatId>, InventoryError> {
        self.inner.available_seats(trip_id).await
    }

    async fn seat_map(&self, trip_id: &TripId) -> Result<SeatMap, InventoryError> {
        self.inner.seat_map(trip_id).await
    }

    async fn expired_holds(&self) -> Result<Vec<SeatHold>, InventoryError> {
        self.inner.expired_holds().await
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub inventory: Arc<FlakyInventory>,
    pub ledger: Arc<FlakyLedger>,
    pub bus: BroadcastEventPublisher,
    pub manager: Arc<ReservationManager>,
    pub query: QueryService,
}

fn trip(id: &str, seats: &[&str], booked: &[&str]) -> Trip {
    let departure = Utc.with_ymd_and_hms(2026, 12, 24, 8, 0, 0).unwrap();
    Trip {
        id: TripId::from(id),
        origin: "Heathrow Airport (LHR)".to_string(),
        destination: "Central London".to_string(),
        departure,
        arrival: departure + Duration::minutes(75),
        vehicle_type: "Minibus".to_string(),
        capacity: seats.len() as u32,
        base_fare: FARE,
        currency: "GBP".to_string(),
        seat_ids: seats.iter().map(|s| SeatId::from(*s)).collect(),
        booked_seats: booked.iter().map(|s| SeatId::from(*s)).collect(),
        stops: 0,
        amenities: vec!["WiFi".to_string()],
    }
}

/// `T1`: five seats, only "5" free. `T2`: four free seats.
pub fn trips() -> Vec<Trip> {
    vec![
        trip("T1", &["1", "2", "3", "4", "5"], &["1", "2", "3", "4"]),
        trip("T2", &["1", "2", "3", "4"], &[]),
    ]
}

pub async fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 12, 1, 10, 0, 0).unwrap()));
    let catalog = Arc::new(InMemoryTripCatalog::from_trips(trips()).unwrap());

    let inventory = Arc::new(FlakyInventory {
        inner: InMemorySeatInventory::new(clock.clone()),
        fail_release_hold: AtomicBool::new(false),
        fail_reinstate: AtomicBool::new(false),
    });
    for trip in trips() {
        inventory.register_trip(&trip).await.unwrap();
    }

    let ledger = Arc::new(FlakyLedger {
        inner: InMemoryBookingLedger::new(clock.clone(), Arc::new(RandomReferenceGenerator::default())),
        fail_create: AtomicBool::new(false),
        fail_finalize: AtomicBool::new(false),
        fail_cancel: AtomicBool::new(false),
    });

    let bus = BroadcastEventPublisher::new(256);
    let manager = Arc::new(ReservationManager::new(
        catalog.clone(),
        inventory.clone(),
        ledger.clone(),
        Arc::new(bus.clone()),
        clock.clone(),
        Duration::minutes(10),
    ));
    let query = QueryService::new(catalog, inventory.clone(), ledger.clone(), PricingEngine::default());

    Harness {
        clock,
        inventory,
        ledger,
        bus,
        manager,
        query,
    }
}

pub fn passenger(name: &str) -> PassengerDetails {
    PassengerDetails {
        full_name: name.to_string(),
        email: Masked(format!("{}@example.com", name.to_lowercase())),
        phone: Masked("+447700900123".to_string()),
    }
}

pub fn request(trip: &str, seats: &[&str], user: Option<&str>) -> ReserveRequest {
    ReserveRequest {
        trip_id: TripId::from(trip),
        seats: seats.iter().map(|s| SeatId::from(*s)).collect(),
        passenger: passenger("Ada"),
        total_amount: FARE * seats.len() as i64,
        user_id: user.map(UserId::from),
    }
}

pub fn payment_for(booking: &Booking, txn: &str) -> PaymentRecord {
    PaymentRecord {
        provider_txn_id: txn.to_string(),
        status: PaymentStatus::Succeeded,
        amount: booking.total_amount,
        currency: booking.currency.clone(),
        settled_at: Utc.with_ymd_and_hms(2026, 12, 1, 10, 5, 0).unwrap(),
    }
}

pub async fn available(h: &Harness, trip: &str) -> BTreeSet<SeatId> {
    h.inventory.available_seats(&TripId::from(trip)).await.unwrap()
}

pub fn drain(rx: &mut broadcast::Receiver<BookingEvent>) -> Vec<BookingEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

impl Harness {
    pub async fn ledger_booking(&self, id: BookingId) -> Booking {
        self.ledger.get(id).await.unwrap().unwrap()
    }
}
