use chrono::{DateTime, Duration, Utc};
use shuttle_core::{Booking, Clock, PaymentEvent, PaymentStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::manager::{ReservationError, ReservationManager};

/// How long an event id is remembered after it was claimed.
pub const DEFAULT_CLAIM_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_MAX_CLAIMS: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    Confirmed(Booking),
    Expired(Booking),
    /// The event id was already processed or is being processed.
    Duplicate,
    /// Intermediate provider states carry no decision.
    Ignored(PaymentStatus),
}

/// Event ids seen within the retention window, oldest first. Each claim gets a
/// sequence number so a released and re-claimed id is not evicted by its
/// earlier entry.
#[derive(Default)]
struct Claims {
    by_id: HashMap<String, u64>,
    order: VecDeque<(String, u64, DateTime<Utc>)>,
    next_seq: u64,
}

impl Claims {
    /// Forget claims older than `cutoff`, then the oldest ones until there is
    /// room for one more under `max`.
    fn prune(&mut self, cutoff: DateTime<Utc>, max: usize) {
        while let Some((id, seq, at)) = self.order.front() {
            if *at >= cutoff && self.order.len() < max {
                break;
            }
            if self.by_id.get(id) == Some(seq) {
                self.by_id.remove(id);
            }
            self.order.pop_front();
        }
    }

    fn insert(&mut self, event_id: &str, at: DateTime<Utc>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_id.insert(event_id.to_string(), seq);
        self.order.push_back((event_id.to_string(), seq, at));
    }
}

/// Turns provider payment notifications into exactly one `confirm` or
/// `expire_or_fail` call per event id.
///
/// Claims are kept for a bounded window. A replay older than that reaches the
/// manager again, which treats repeated confirmations and expiries as no-ops.
pub struct PaymentCallbackHandler {
    manager: Arc<ReservationManager>,
    clock: Arc<dyn Clock>,
    claims: Mutex<Claims>,
    window: Duration,
    max_claims: usize,
}

impl PaymentCallbackHandler {
    pub fn new(manager: Arc<ReservationManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            manager,
            clock,
            claims: Mutex::new(Claims::default()),
            window: Duration::hours(DEFAULT_CLAIM_WINDOW_HOURS),
            max_claims: DEFAULT_MAX_CLAIMS,
        }
    }

    pub fn with_retention(mut self, window: Duration, max_claims: usize) -> Self {
        self.window = window;
        self.max_claims = max_claims.max(1);
        self
    }

    /// Event ids currently remembered.
    pub fn claim_count(&self) -> usize {
        self.claims.lock().unwrap_or_else(|e| e.into_inner()).by_id.len()
    }

    pub async fn handle(&self, event: PaymentEvent) -> Result<CallbackOutcome, ReservationError> {
        if !self.claim(&event.event_id) {
            warn!(event_id = %event.event_id, booking_id = %event.booking_id, "duplicate payment event ignored");
            return Ok(CallbackOutcome::Duplicate);
        }

        info!(event_id = %event.event_id, booking_id = %event.booking_id, status = ?event.status, "processing payment event");
        let result = match event.status {
            PaymentStatus::Succeeded => self
                .manager
                .confirm(event.booking_id, event.record())
                .await
                .map(CallbackOutcome::Confirmed),
            PaymentStatus::Failed => self
                .manager
                .expire_or_fail(event.booking_id)
                .await
                .map(CallbackOutcome::Expired),
            PaymentStatus::Pending => Ok(CallbackOutcome::Ignored(PaymentStatus::Pending)),
        };

        if let Err(e) = &result {
            if e.is_retryable() {
                // Let the provider's redelivery through.
                self.release(&event.event_id);
                warn!(event_id = %event.event_id, error = %e, "payment event failed, will accept redelivery");
            } else {
                warn!(event_id = %event.event_id, error = %e, "payment event rejected");
            }
        }
        result
    }

    fn claim(&self, event_id: &str) -> bool {
        let now = self.clock.now();
        let mut claims = self.claims.lock().unwrap_or_else(|e| e.into_inner());
        claims.prune(now - self.window, self.max_claims);

        if claims.by_id.contains_key(event_id) {
            return false;
        }
        claims.insert(event_id, now);
        debug!(event_id, claims = claims.by_id.len(), "payment event claimed");
        true
    }

    fn release(&self, event_id: &str) {
        self.claims
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_id
            .remove(event_id);
    }
}
