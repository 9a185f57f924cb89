use chrono::Duration;
use shuttle_core::{
    Booking, BookingDraft, BookingId, BookingLedger, BookingStatus, CatalogError, Clock,
    EventPublisher, InventoryError, LedgerError, PassengerDetails, PaymentError, PaymentRecord,
    PaymentStatus, SeatHold, SeatId, SeatInventory, TripCatalog, TripId, UserId,
};
use shuttle_shared::BookingEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::locks::TripLocks;

/// Input to [`ReservationManager::reserve`].
#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub trip_id: TripId,
    pub seats: Vec<SeatId>,
    pub passenger: PassengerDetails,
    /// Amount in minor units of the trip's currency
    pub total_amount: i64,
    pub user_id: Option<UserId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Seats unavailable on trip {trip_id}: {}", seat_strings(.seats).join(", "))]
    SeatsUnavailable { trip_id: TripId, seats: Vec<SeatId> },

    #[error("Invalid seat selection: {0}")]
    InvalidSeats(String),

    #[error("Invalid booking amount: {0}")]
    InvalidAmount(i64),

    #[error("Booking {booking_id} is {status} and cannot be {action}")]
    InvalidState {
        booking_id: BookingId,
        status: BookingStatus,
        action: &'static str,
    },

    #[error("Not permitted to manage this booking")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Seat hold for booking {0} expired before payment was applied")]
    HoldExpired(BookingId),

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Payment of {paid} {paid_currency} does not match booking total {expected} {expected_currency}")]
    PaymentMismatch {
        expected: i64,
        expected_currency: String,
        paid: i64,
        paid_currency: String,
    },

    #[error("Compensation failed after '{original}': {compensation}")]
    CompensationFailed { original: String, compensation: String },

    #[error(transparent)]
    Inventory(InventoryError),

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Catalog(CatalogError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl ReservationError {
    /// Failures of the backing stores that may succeed if the same call is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReservationError::Inventory(_)
                | ReservationError::Ledger(_)
                | ReservationError::Catalog(_)
                | ReservationError::CompensationFailed { .. }
        )
    }
}

impl From<InventoryError> for ReservationError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::SeatsUnavailable { trip_id, seats } => {
                ReservationError::SeatsUnavailable { trip_id, seats }
            }
            InventoryError::InvalidSeats(msg) => ReservationError::InvalidSeats(msg),
            InventoryError::TripNotFound(id) => ReservationError::NotFound(format!("trip {}", id)),
            other => ReservationError::Inventory(other),
        }
    }
}

impl From<LedgerError> for ReservationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => ReservationError::NotFound(format!("booking {}", id)),
            LedgerError::InvalidTransition { booking_id, from, .. } => ReservationError::InvalidState {
                booking_id,
                status: from,
                action: "changed",
            },
            other => ReservationError::Ledger(other),
        }
    }
}

impl From<CatalogError> for ReservationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::TripNotFound(id) => ReservationError::NotFound(format!("trip {}", id)),
            other => ReservationError::Catalog(other),
        }
    }
}

/// Coordinates the seat inventory and the booking ledger.
///
/// Every operation that touches both stores runs under the trip's lock, so the
/// booked-seat set, live holds and booking statuses move together. Events are
/// published once the lock is released.
pub struct ReservationManager {
    catalog: Arc<dyn TripCatalog>,
    inventory: Arc<dyn SeatInventory>,
    ledger: Arc<dyn BookingLedger>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    locks: TripLocks,
    hold_ttl: Duration,
    /// Payments whose seats are committed but whose ledger write failed.
    unsettled: Mutex<HashMap<BookingId, PaymentRecord>>,
}

impl ReservationManager {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        inventory: Arc<dyn SeatInventory>,
        ledger: Arc<dyn BookingLedger>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        hold_ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            inventory,
            ledger,
            events,
            clock,
            locks: TripLocks::new(),
            hold_ttl,
            unsettled: Mutex::new(HashMap::new()),
        }
    }

    pub fn hold_ttl(&self) -> Duration {
        self.hold_ttl
    }

    /// Paid bookings still waiting for their confirmation to be written.
    pub fn unsettled_count(&self) -> usize {
        self.unsettled().len()
    }

    /// Hold the seats and write a pending booking, or do neither.
    pub async fn reserve(&self, request: ReserveRequest) -> Result<Booking, ReservationError> {
        if request.total_amount <= 0 {
            return Err(ReservationError::InvalidAmount(request.total_amount));
        }

        let trip = self
            .catalog
            .get_trip(&request.trip_id)
            .await?
            .ok_or_else(|| ReservationError::NotFound(format!("trip {}", request.trip_id)))?;

        let booking_id = BookingId::new();
        let (booking, hold) = {
            let _guard = self.locks.acquire(&trip.id).await;

            let hold = match self
                .inventory
                .try_hold(&trip.id, &request.seats, booking_id, self.hold_ttl)
                .await
            {
                Ok(hold) => hold,
                Err(e) => {
                    debug!(trip_id = %trip.id, seats = ?request.seats, error = %e, "reservation rejected");
                    return Err(e.into());
                }
            };

            let draft = BookingDraft {
                id: booking_id,
                user_id: request.user_id,
                trip_id: trip.id.clone(),
                trip: trip.summary(),
                passenger: request.passenger,
                seats: hold.seat_list(),
                total_amount: request.total_amount,
                currency: trip.currency.clone(),
                hold_id: hold.id,
                hold_expires_at: hold.expires_at,
            };

            match self.ledger.create(draft).await {
                Ok(booking) => (booking, hold),
                Err(e) => {
                    if let Err(comp) = self.inventory.release_hold(hold.id).await {
                        error!(trip_id = %trip.id, hold_id = %hold.id, error = %e, compensation_error = %comp, "failed to release hold after booking create failed");
                        return Err(ReservationError::CompensationFailed {
                            original: e.to_string(),
                            compensation: comp.to_string(),
                        });
                    }
                    warn!(trip_id = %trip.id, hold_id = %hold.id, error = %e, "booking create failed, hold released");
                    return Err(e.into());
                }
            }
        };

        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            trip_id = %booking.trip_id,
            seats = ?booking.seats,
            expires_at = %booking.hold_expires_at,
            "seats reserved"
        );
        self.publish(vec![seats_held(&hold)]);
        Ok(booking)
    }

    /// Apply a successful payment. Repeating a confirmation with the same
    /// provider transaction returns the confirmed booking unchanged.
    pub async fn confirm(&self, booking_id: BookingId, payment: PaymentRecord) -> Result<Booking, ReservationError> {
        if payment.status != PaymentStatus::Succeeded {
            return Err(ReservationError::InvalidPayment(format!(
                "payment {} has status {:?}",
                payment.provider_txn_id, payment.status
            )));
        }

        let trip_id = self.load(booking_id).await?.trip_id;
        let mut events = Vec::new();
        let result = {
            let _guard = self.locks.acquire(&trip_id).await;
            self.confirm_locked(booking_id, payment, &mut events).await
        };
        self.publish(events);
        result
    }

    async fn confirm_locked(
        &self,
        booking_id: BookingId,
        payment: PaymentRecord,
        events: &mut Vec<BookingEvent>,
    ) -> Result<Booking, ReservationError> {
        let booking = self.load(booking_id).await?;

        match booking.status {
            BookingStatus::Pending => {}
            BookingStatus::Confirmed => {
                let same_payment = booking
                    .payment
                    .as_ref()
                    .is_some_and(|p| p.provider_txn_id == payment.provider_txn_id);
                if same_payment {
                    self.unsettled().remove(&booking_id);
                    debug!(booking_id = %booking_id, provider_txn_id = %payment.provider_txn_id, "confirmation replayed");
                    return Ok(booking);
                }
                error!(booking_id = %booking_id, provider_txn_id = %payment.provider_txn_id, "second payment for confirmed booking");
                return Err(ReservationError::InvalidState {
                    booking_id,
                    status: booking.status,
                    action: "confirmed again",
                });
            }
            BookingStatus::Expired => {
                warn!(booking_id = %booking_id, reference = %booking.reference, provider_txn_id = %payment.provider_txn_id, "payment arrived for expired booking, refund required");
                return Err(ReservationError::HoldExpired(booking_id));
            }
            BookingStatus::Cancelled => {
                error!(booking_id = %booking_id, provider_txn_id = %payment.provider_txn_id, "payment arrived for cancelled booking");
                return Err(ReservationError::InvalidState {
                    booking_id,
                    status: booking.status,
                    action: "confirmed",
                });
            }
        }

        if payment.amount != booking.total_amount || !payment.currency.eq_ignore_ascii_case(&booking.currency) {
            warn!(booking_id = %booking_id, expected = booking.total_amount, paid = payment.amount, "payment does not match booking");
            return Err(ReservationError::PaymentMismatch {
                expected: booking.total_amount,
                expected_currency: booking.currency.clone(),
                paid: payment.amount,
                paid_currency: payment.currency,
            });
        }

        match self.inventory.commit_hold(booking.hold_id).await {
            Ok(()) => {}
            Err(InventoryError::HoldExpired(_)) | Err(InventoryError::HoldNotFound(_)) => {
                warn!(booking_id = %booking_id, reference = %booking.reference, provider_txn_id = %payment.provider_txn_id, "hold lapsed and seats were retaken, refund required");
                let expired = self.ledger.mark_expired(booking_id).await?;
                self.inventory.release_hold(booking.hold_id).await?;
                events.push(booking_expired(&expired, self.clock.now().timestamp()));
                return Err(ReservationError::HoldExpired(booking_id));
            }
            Err(e) => return Err(e.into()),
        }

        match self.ledger.finalize(booking_id, payment.clone()).await {
            Ok(confirmed) => {
                self.unsettled().remove(&booking_id);
                info!(booking_id = %booking_id, reference = %confirmed.reference, trip_id = %confirmed.trip_id, status = %confirmed.status, "booking confirmed");
                events.push(booking_confirmed(&confirmed, self.clock.now().timestamp()));
                Ok(confirmed)
            }
            Err(e) => {
                // The seats stay committed to the paid booking. A redelivered
                // payment or the next sweep writes the confirmation.
                error!(booking_id = %booking_id, provider_txn_id = %payment.provider_txn_id, error = %e, "finalize failed, payment kept for retry");
                self.unsettled().insert(booking_id, payment);
                Err(e.into())
            }
        }
    }

    /// Expire a pending booking and give its held seats back. Running it again on
    /// an expired booking re-releases the hold, which is a no-op once it is gone.
    pub async fn expire_or_fail(&self, booking_id: BookingId) -> Result<Booking, ReservationError> {
        let trip_id = self.load(booking_id).await?.trip_id;
        let mut events = Vec::new();
        let result = {
            let _guard = self.locks.acquire(&trip_id).await;
            self.expire_locked(booking_id, &mut events).await
        };
        self.publish(events);
        result.map(|(booking, _)| booking)
    }

    /// Returns the booking and whether this call moved it to expired.
    async fn expire_locked(
        &self,
        booking_id: BookingId,
        events: &mut Vec<BookingEvent>,
    ) -> Result<(Booking, bool), ReservationError> {
        let booking = self.load(booking_id).await?;

        match booking.status {
            BookingStatus::Pending => {
                let expired = self.ledger.mark_expired(booking_id).await?;
                self.inventory.release_hold(booking.hold_id).await?;

                let now = self.clock.now().timestamp();
                info!(booking_id = %booking_id, reference = %expired.reference, trip_id = %expired.trip_id, seats = ?expired.seats, "booking expired, seats released");
                events.push(booking_expired(&expired, now));
                events.push(BookingEvent::SeatsReleased {
                    trip_id: expired.trip_id.0.clone(),
                    booking_id: expired.id.0,
                    seats: seat_strings(&expired.seats),
                    timestamp: now,
                });
                Ok((expired, true))
            }
            BookingStatus::Expired => {
                self.inventory.release_hold(booking.hold_id).await?;
                debug!(booking_id = %booking_id, "booking already expired");
                Ok((booking, false))
            }
            status => Err(ReservationError::InvalidState {
                booking_id,
                status,
                action: "expired",
            }),
        }
    }

    /// Cancel a confirmed booking on behalf of `requester` and return its seats.
    pub async fn cancel(&self, booking_id: BookingId, requester: Option<&UserId>) -> Result<Booking, ReservationError> {
        // Unknown ids answer like someone else's booking.
        let Some(booking) = self.ledger.get(booking_id).await? else {
            warn!(booking_id = %booking_id, "cancellation of unknown booking rejected");
            return Err(ReservationError::Unauthorized);
        };
        if !booking.is_owned_by(requester) {
            warn!(booking_id = %booking_id, requester = ?requester.map(|u| u.0.as_str()), "cancellation by non-owner rejected");
            return Err(ReservationError::Unauthorized);
        }

        let mut events = Vec::new();
        let result = {
            let _guard = self.locks.acquire(&booking.trip_id).await;
            self.cancel_locked(booking_id, &mut events).await
        };
        self.publish(events);
        result
    }

    async fn cancel_locked(
        &self,
        booking_id: BookingId,
        events: &mut Vec<BookingEvent>,
    ) -> Result<Booking, ReservationError> {
        let booking = self.load(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            warn!(booking_id = %booking_id, status = %booking.status, "cancellation of non-confirmed booking rejected");
            return Err(ReservationError::InvalidState {
                booking_id,
                status: booking.status,
                action: "cancelled",
            });
        }

        self.inventory.release(&booking.trip_id, &booking.seats).await?;

        let cancelled = match self.ledger.cancel(booking_id).await {
            Ok(cancelled) => cancelled,
            Err(e) => {
                if let Err(comp) = self.inventory.reinstate(&booking.trip_id, &booking.seats).await {
                    error!(booking_id = %booking_id, trip_id = %booking.trip_id, seats = ?booking.seats, error = %e, compensation_error = %comp, "failed to reinstate seats after cancel failed");
                    return Err(ReservationError::CompensationFailed {
                        original: e.to_string(),
                        compensation: comp.to_string(),
                    });
                }
                error!(booking_id = %booking_id, error = %e, "cancel failed, seats reinstated");
                return Err(e.into());
            }
        };

        let now = self.clock.now().timestamp();
        info!(booking_id = %booking_id, reference = %cancelled.reference, trip_id = %cancelled.trip_id, seats = ?cancelled.seats, "booking cancelled");
        events.push(BookingEvent::BookingCancelled {
            trip_id: cancelled.trip_id.0.clone(),
            booking_id: cancelled.id.0,
            reference: cancelled.reference.0.clone(),
            seats: seat_strings(&cancelled.seats),
            timestamp: now,
        });
        events.push(BookingEvent::SeatsReleased {
            trip_id: cancelled.trip_id.0.clone(),
            booking_id: cancelled.id.0,
            seats: seat_strings(&cancelled.seats),
            timestamp: now,
        });
        Ok(cancelled)
    }

    /// Expire every booking whose hold has lapsed. Returns how many bookings
    /// were moved to expired by this pass.
    pub async fn sweep_expired_holds(&self) -> Result<usize, ReservationError> {
        let settled = self.settle_unsettled().await;
        if settled > 0 {
            info!(settled, "sweep applied pending payments");
        }

        let holds = self.inventory.expired_holds().await?;
        let mut expired = 0;

        for hold in holds {
            match self.sweep_one(&hold).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => warn!(hold_id = %hold.id, booking_id = %hold.holder, error = %e, "sweep could not expire hold"),
            }
        }

        if expired > 0 {
            info!(expired, "hold sweep finished");
        }
        Ok(expired)
    }

    /// Retry the ledger write for payments whose seats were already committed.
    /// Returns how many bookings ended up confirmed.
    async fn settle_unsettled(&self) -> usize {
        let pending: Vec<(BookingId, PaymentRecord)> =
            self.unsettled().iter().map(|(id, p)| (*id, p.clone())).collect();

        let mut settled = 0;
        for (booking_id, payment) in pending {
            match self.confirm(booking_id, payment).await {
                Ok(_) => settled += 1,
                Err(e) if e.is_retryable() => {
                    warn!(booking_id = %booking_id, error = %e, "pending payment still cannot be applied");
                }
                Err(e) => {
                    self.unsettled().remove(&booking_id);
                    error!(booking_id = %booking_id, error = %e, "dropping pending payment, refund required");
                }
            }
        }
        settled
    }

    async fn sweep_one(&self, hold: &SeatHold) -> Result<bool, ReservationError> {
        let mut events = Vec::new();
        let result = {
            let _guard = self.locks.acquire(&hold.trip_id).await;
            match self.ledger.get(hold.holder).await? {
                // Confirmed while this pass was waiting for the lock.
                Some(booking) if booking.status == BookingStatus::Confirmed => Ok(false),
                Some(_) => self.expire_locked(hold.holder, &mut events).await.map(|(_, changed)| changed),
                None => {
                    // Left behind by a reservation whose compensation failed.
                    warn!(hold_id = %hold.id, trip_id = %hold.trip_id, "releasing hold without a booking");
                    self.inventory.release_hold(hold.id).await?;
                    events.push(BookingEvent::SeatsReleased {
                        trip_id: hold.trip_id.0.clone(),
                        booking_id: hold.holder.0,
                        seats: seat_strings(&hold.seat_list()),
                        timestamp: self.clock.now().timestamp(),
                    });
                    Ok(false)
                }
            }
        };
        self.publish(events);
        result
    }

    async fn load(&self, booking_id: BookingId) -> Result<Booking, ReservationError> {
        self.ledger
            .get(booking_id)
            .await?
            .ok_or_else(|| ReservationError::NotFound(format!("booking {}", booking_id)))
    }

    fn unsettled(&self) -> MutexGuard<'_, HashMap<BookingId, PaymentRecord>> {
        self.unsettled.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, events: Vec<BookingEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }
}

fn seat_strings(seats: &[SeatId]) -> Vec<String> {
    seats.iter().map(|s| s.0.clone()).collect()
}

fn seats_held(hold: &SeatHold) -> BookingEvent {
    BookingEvent::SeatsHeld {
        trip_id: hold.trip_id.0.clone(),
        booking_id: hold.holder.0,
        seats: seat_strings(&hold.seat_list()),
        expires_at: hold.expires_at.timestamp(),
        timestamp: hold.created_at.timestamp(),
    }
}

fn booking_confirmed(booking: &Booking, timestamp: i64) -> BookingEvent {
    BookingEvent::BookingConfirmed {
        trip_id: booking.trip_id.0.clone(),
        booking_id: booking.id.0,
        reference: booking.reference.0.clone(),
        seats: seat_strings(&booking.seats),
        total_amount: booking.total_amount,
        currency: booking.currency.clone(),
        timestamp,
    }
}

fn booking_expired(booking: &Booking, timestamp: i64) -> BookingEvent {
    BookingEvent::BookingExpired {
        trip_id: booking.trip_id.0.clone(),
        booking_id: booking.id.0,
        reference: booking.reference.0.clone(),
        timestamp,
    }
}
