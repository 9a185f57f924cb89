use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::booking::BookingId;
use crate::trip::{SeatId, TripId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(pub Uuid);

impl HoldId {
    pub fn new() -> Self {
        HoldId(Uuid::new_v4())
    }
}

impl Default for HoldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Time-bounded provisional reservation of seats pending payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatHold {
    pub id: HoldId,
    pub trip_id: TripId,
    pub seats: BTreeSet<SeatId>,
    pub holder: BookingId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SeatHold {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn seat_list(&self) -> Vec<SeatId> {
        self.seats.iter().cloned().collect()
    }
}
