use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shuttle_shared::Masked;
use std::fmt;
use uuid::Uuid;

use crate::hold::HoldId;
use crate::identity::UserId;
use crate::payment::PaymentRecord;
use crate::trip::{SeatId, TripId, TripSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn new() -> Self {
        BookingId(Uuid::new_v4())
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-facing booking code, e.g. `BBE-K7QX2M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingReference(pub String);

impl BookingReference {
    /// Canonical form used for lookups: trimmed and upper-cased.
    pub fn normalize(raw: &str) -> Self {
        BookingReference(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Booking lifecycle.
///
/// `Pending -> Confirmed -> Cancelled`, `Pending -> Expired`. Nothing re-enters `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Expired)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Expired)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerDetails {
    pub full_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

/// Everything the ledger needs to write a pending booking. The reference is
/// assigned by the ledger.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub id: BookingId,
    pub user_id: Option<UserId>,
    pub trip_id: TripId,
    pub trip: TripSummary,
    pub passenger: PassengerDetails,
    pub seats: Vec<SeatId>,
    pub total_amount: i64,
    pub currency: String,
    pub hold_id: HoldId,
    pub hold_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub reference: BookingReference,
    pub user_id: Option<UserId>,
    pub trip_id: TripId,
    pub trip: TripSummary,
    pub passenger: PassengerDetails,
    pub seats: Vec<SeatId>,
    pub total_amount: i64,
    pub currency: String,
    pub hold_id: HoldId,
    pub hold_expires_at: DateTime<Utc>,
    pub payment: Option<PaymentRecord>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_draft(draft: BookingDraft, reference: BookingReference, now: DateTime<Utc>) -> Self {
        Self {
            id: draft.id,
            reference,
            user_id: draft.user_id,
            trip_id: draft.trip_id,
            trip: draft.trip,
            passenger: draft.passenger,
            seats: draft.seats,
            total_amount: draft.total_amount,
            currency: draft.currency,
            hold_id: draft.hold_id,
            hold_expires_at: draft.hold_expires_at,
            payment: None,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Guest bookings have no owner and may be managed by whoever holds the id.
    pub fn is_owned_by(&self, requester: Option<&UserId>) -> bool {
        match &self.user_id {
            None => true,
            Some(owner) => requester == Some(owner),
        }
    }
}
