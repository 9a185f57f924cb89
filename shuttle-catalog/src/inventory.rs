use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shuttle_core::{
    BookingId, Clock, HoldId, InventoryError, SeatHold, SeatId, SeatInventory, SeatMap,
    SeatMapEntry, SeatState, Trip, TripId,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// In-memory seat inventory.
///
/// Each trip's seats sit behind their own mutex, so holds, commits and
/// releases on one trip are serialized while other trips proceed in parallel.
/// Tokio's mutex is fair, which gives arrival-order handling per trip.
pub struct InMemorySeatInventory {
    clock: Arc<dyn Clock>,
    trips: RwLock<HashMap<TripId, Arc<Mutex<TripSeats>>>>,
    /// hold id -> owning trip, so holds can be resolved by id alone
    hold_index: RwLock<HashMap<HoldId, TripId>>,
}

struct TripSeats {
    seat_ids: Vec<SeatId>,
    booked: BTreeSet<SeatId>,
    holds: HashMap<HoldId, HoldEntry>,
}

struct HoldEntry {
    hold: SeatHold,
    committed: bool,
}

impl TripSeats {
    fn from_trip(trip: &Trip) -> Self {
        Self {
            seat_ids: trip.seat_ids.clone(),
            booked: trip.booked_seats.clone(),
            holds: HashMap::new(),
        }
    }

    /// Reject empty, duplicated or unknown seats before touching any state.
    fn validate(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<BTreeSet<SeatId>, InventoryError> {
        if seats.is_empty() {
            return Err(InventoryError::InvalidSeats("no seats requested".to_string()));
        }

        let requested: BTreeSet<SeatId> = seats.iter().cloned().collect();
        if requested.len() != seats.len() {
            return Err(InventoryError::InvalidSeats("a seat was requested more than once".to_string()));
        }

        let known: HashSet<&SeatId> = self.seat_ids.iter().collect();
        if let Some(unknown) = requested.iter().find(|s| !known.contains(s)) {
            return Err(InventoryError::InvalidSeats(format!(
                "seat {} does not exist on trip {}",
                unknown, trip_id
            )));
        }

        Ok(requested)
    }

    /// Seats covered by uncommitted holds that are still within their TTL.
    fn live_held(&self, now: DateTime<Utc>, except: Option<HoldId>) -> BTreeSet<SeatId> {
        self.holds
            .values()
            .filter(|e| !e.committed && !e.hold.is_expired(now) && Some(e.hold.id) != except)
            .flat_map(|e| e.hold.seats.iter().cloned())
            .collect()
    }

    fn conflicts(&self, seats: &BTreeSet<SeatId>, now: DateTime<Utc>, except: Option<HoldId>) -> Vec<SeatId> {
        let held = self.live_held(now, except);
        seats
            .iter()
            .filter(|s| self.booked.contains(*s) || held.contains(*s))
            .cloned()
            .collect()
    }

    fn available(&self, now: DateTime<Utc>) -> BTreeSet<SeatId> {
        let held = self.live_held(now, None);
        self.seat_ids
            .iter()
            .filter(|s| !self.booked.contains(*s) && !held.contains(*s))
            .cloned()
            .collect()
    }
}

impl InMemorySeatInventory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            trips: RwLock::new(HashMap::new()),
            hold_index: RwLock::new(HashMap::new()),
        }
    }

    async fn trip(&self, trip_id: &TripId) -> Result<Arc<Mutex<TripSeats>>, InventoryError> {
        self.trips
            .read()
            .await
            .get(trip_id)
            .cloned()
            .ok_or_else(|| InventoryError::TripNotFound(trip_id.clone()))
    }

    async fn trip_of_hold(&self, hold_id: HoldId) -> Option<TripId> {
        self.hold_index.read().await.get(&hold_id).cloned()
    }

    /// Number of holds currently tracked, committed or not.
    pub async fn hold_count(&self) -> usize {
        self.hold_index.read().await.len()
    }
}

#[async_trait]
impl SeatInventory for InMemorySeatInventory {
    async fn register_trip(&self, trip: &Trip) -> Result<(), InventoryError> {
        let mut trips = self.trips.write().await;
        if trips.contains_key(&trip.id) {
            debug!(trip_id = %trip.id, "trip already registered, keeping live seat state");
            return Ok(());
        }
        trips.insert(trip.id.clone(), Arc::new(Mutex::new(TripSeats::from_trip(trip))));
        info!(trip_id = %trip.id, seats = trip.seat_ids.len(), booked = trip.booked_seats.len(), "trip registered with inventory");
        Ok(())
    }

    async fn try_hold(
        &self,
        trip_id: &TripId,
        seats: &[SeatId],
        holder: BookingId,
        ttl: Duration,
    ) -> Result<SeatHold, InventoryError> {
        let trip = self.trip(trip_id).await?;
        let mut state = trip.lock().await;

        let requested = state.validate(trip_id, seats)?;
        let now = self.clock.now();

        let conflicts = state.conflicts(&requested, now, None);
        if !conflicts.is_empty() {
            debug!(trip_id = %trip_id, holder = %holder, ?conflicts, "hold rejected");
            return Err(InventoryError::SeatsUnavailable {
                trip_id: trip_id.clone(),
                seats: conflicts,
            });
        }

        let hold = SeatHold {
            id: HoldId::new(),
            trip_id: trip_id.clone(),
            seats: requested,
            holder,
            created_at: now,
            expires_at: now + ttl,
        };
        state.holds.insert(hold.id, HoldEntry { hold: hold.clone(), committed: false });
        self.hold_index.write().await.insert(hold.id, trip_id.clone());

        debug!(trip_id = %trip_id, hold_id = %hold.id, holder = %holder, expires_at = %hold.expires_at, "seats held");
        Ok(hold)
    }

    async fn commit_hold(&self, hold_id: HoldId) -> Result<(), InventoryError> {
        let trip_id = self
            .trip_of_hold(hold_id)
            .await
            .ok_or(InventoryError::HoldNotFound(hold_id))?;
        let trip = self.trip(&trip_id).await?;
        let mut state = trip.lock().await;
        let now = self.clock.now();

        let (seats, expired) = match state.holds.get(&hold_id) {
            None => return Err(InventoryError::HoldNotFound(hold_id)),
            Some(entry) if entry.committed => return Ok(()),
            Some(entry) => (entry.hold.seats.clone(), entry.hold.is_expired(now)),
        };

        // A lapsed hold can still be honoured if nobody has taken its seats since.
        if expired && !state.conflicts(&seats, now, Some(hold_id)).is_empty() {
            return Err(InventoryError::HoldExpired(hold_id));
        }

        state.booked.extend(seats);
        if let Some(entry) = state.holds.get_mut(&hold_id) {
            entry.committed = true;
        }

        debug!(trip_id = %trip_id, hold_id = %hold_id, late = expired, "hold committed");
        Ok(())
    }

    async fn release_hold(&self, hold_id: HoldId) -> Result<(), InventoryError> {
        let Some(trip_id) = self.trip_of_hold(hold_id).await else {
            return Ok(());
        };
        let trip = self.trip(&trip_id).await?;
        let mut state = trip.lock().await;

        if let Some(entry) = state.holds.remove(&hold_id) {
            if entry.committed {
                for seat in &entry.hold.seats {
                    state.booked.remove(seat);
                }
            }
            debug!(trip_id = %trip_id, hold_id = %hold_id, committed = entry.committed, "hold released");
        }
        self.hold_index.write().await.remove(&hold_id);
        Ok(())
    }

    async fn release(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError> {
        let trip = self.trip(trip_id).await?;
        let mut state = trip.lock().await;

        let released: BTreeSet<SeatId> = seats.iter().cloned().collect();
        for seat in &released {
            state.booked.remove(seat);
        }

        // Committed holds over these seats have been consumed; forget them.
        let consumed: Vec<HoldId> = state
            .holds
            .values()
            .filter(|e| e.committed && !e.hold.seats.is_disjoint(&released))
            .map(|e| e.hold.id)
            .collect();
        for id in &consumed {
            state.holds.remove(id);
        }
        if !consumed.is_empty() {
            let mut index = self.hold_index.write().await;
            for id in &consumed {
                index.remove(id);
            }
        }

        debug!(trip_id = %trip_id, seats = ?released, "seats released");
        Ok(())
    }

    async fn reinstate(&self, trip_id: &TripId, seats: &[SeatId]) -> Result<(), InventoryError> {
        let trip = self.trip(trip_id).await?;
        let mut state = trip.lock().await;

        let requested = state.validate(trip_id, seats)?;
        let now = self.clock.now();
        let conflicts = state.conflicts(&requested, now, None);
        if !conflicts.is_empty() {
            return Err(InventoryError::SeatsUnavailable {
                trip_id: trip_id.clone(),
                seats: conflicts,
            });
        }

        state.booked.extend(requested);
        Ok(())
    }

    async fn available_seats(&self, trip_id: &TripId) -> Result<BTreeSet<SeatId>, InventoryError> {
        let trip = self.trip(trip_id).await?;
        let state = trip.lock().await;
        Ok(state.available(self.clock.now()))
    }

    async fn seat_map(&self, trip_id: &TripId) -> Result<SeatMap, InventoryError> {
        let trip = self.trip(trip_id).await?;
        let state = trip.lock().await;
        let held = state.live_held(self.clock.now(), None);

        let seats = state
            .seat_ids
            .iter()
            .map(|seat| {
                let seat_state = if state.booked.contains(seat) {
                    SeatState::Booked
                } else if held.contains(seat) {
                    SeatState::Held
                } else {
                    SeatState::Available
                };
                SeatMapEntry { seat_id: seat.clone(), state: seat_state }
            })
            .collect();

        Ok(SeatMap { trip_id: trip_id.clone(), seats })
    }

    async fn expired_holds(&self) -> Result<Vec<SeatHold>, InventoryError> {
        let trips: Vec<Arc<Mutex<TripSeats>>> = self.trips.read().await.values().cloned().collect();
        let now = self.clock.now();

        let mut expired = Vec::new();
        for trip in trips {
            let state = trip.lock().await;
            expired.extend(
                state
                    .holds
                    .values()
                    .filter(|e| !e.committed && e.hold.is_expired(now))
                    .map(|e| e.hold.clone()),
            );
        }
        Ok(expired)
    }
}
