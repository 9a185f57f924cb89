use async_trait::async_trait;
use shuttle_core::{
    Booking, BookingDraft, BookingId, BookingLedger, BookingReference, BookingStatus, Clock,
    LedgerError, PaymentRecord, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::reference::ReferenceGenerator;

pub const DEFAULT_REFERENCE_ATTEMPTS: u32 = 8;

#[derive(Default)]
struct LedgerState {
    bookings: HashMap<BookingId, Booking>,
    by_reference: HashMap<BookingReference, BookingId>,
    /// Insertion order per user
    by_user: HashMap<UserId, Vec<BookingId>>,
}

/// In-memory booking ledger. Bookings are never deleted; terminal bookings stay
/// queryable by id and reference.
pub struct InMemoryBookingLedger {
    clock: Arc<dyn Clock>,
    references: Arc<dyn ReferenceGenerator>,
    max_reference_attempts: u32,
    state: RwLock<LedgerState>,
}

impl InMemoryBookingLedger {
    pub fn new(clock: Arc<dyn Clock>, references: Arc<dyn ReferenceGenerator>) -> Self {
        Self {
            clock,
            references,
            max_reference_attempts: DEFAULT_REFERENCE_ATTEMPTS,
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn with_max_reference_attempts(mut self, attempts: u32) -> Self {
        self.max_reference_attempts = attempts.max(1);
        self
    }

    /// Apply a status transition, rejecting anything the state machine forbids.
    async fn transition(
        &self,
        id: BookingId,
        to: BookingStatus,
        payment: Option<PaymentRecord>,
    ) -> Result<Booking, LedgerError> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        if !booking.status.can_transition_to(to) {
            error!(booking_id = %id, from = %booking.status, to = %to, "rejected booking transition");
            return Err(LedgerError::InvalidTransition {
                booking_id: id,
                from: booking.status,
                to,
            });
        }

        booking.status = to;
        if payment.is_some() {
            booking.payment = payment;
        }
        booking.updated_at = self.clock.now();

        debug!(booking_id = %id, reference = %booking.reference, status = %to, "booking transitioned");
        Ok(booking.clone())
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn create(&self, draft: BookingDraft) -> Result<Booking, LedgerError> {
        let mut state = self.state.write().await;

        if state.bookings.contains_key(&draft.id) {
            return Err(LedgerError::DuplicateBooking(draft.id));
        }

        let mut reference = None;
        for attempt in 1..=self.max_reference_attempts {
            let candidate = self.references.generate();
            if !state.by_reference.contains_key(&candidate) {
                reference = Some(candidate);
                break;
            }
            warn!(attempt, candidate = %candidate, "booking reference collision, regenerating");
        }
        let reference = reference.ok_or(LedgerError::ReferenceExhausted(self.max_reference_attempts))?;

        let booking = Booking::from_draft(draft, reference, self.clock.now());
        state.by_reference.insert(booking.reference.clone(), booking.id);
        if let Some(user) = &booking.user_id {
            state.by_user.entry(user.clone()).or_default().push(booking.id);
        }
        state.bookings.insert(booking.id, booking.clone());

        debug!(booking_id = %booking.id, reference = %booking.reference, trip_id = %booking.trip_id, "pending booking created");
        Ok(booking)
    }

    async fn finalize(&self, id: BookingId, payment: PaymentRecord) -> Result<Booking, LedgerError> {
        self.transition(id, BookingStatus::Confirmed, Some(payment)).await
    }

    async fn mark_expired(&self, id: BookingId) -> Result<Booking, LedgerError> {
        self.transition(id, BookingStatus::Expired, None).await
    }

    async fn cancel(&self, id: BookingId) -> Result<Booking, LedgerError> {
        self.transition(id, BookingStatus::Cancelled, None).await
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, LedgerError> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Booking, LedgerError> {
        let reference = BookingReference::normalize(reference);
        let state = self.state.read().await;
        state
            .by_reference
            .get(&reference)
            .and_then(|id| state.bookings.get(id))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(reference.to_string()))
    }

    async fn list_by_user(&self, user: &UserId) -> Result<Vec<Booking>, LedgerError> {
        let state = self.state.read().await;
        let Some(ids) = state.by_user.get(user) else {
            return Ok(Vec::new());
        };

        // Later insertions first, then a stable sort keeps that order for equal timestamps.
        let mut bookings: Vec<Booking> = ids
            .iter()
            .rev()
            .filter_map(|id| state.bookings.get(id).cloned())
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}
