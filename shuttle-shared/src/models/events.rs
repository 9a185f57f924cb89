use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat and booking lifecycle events, published after the state change is durable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    SeatsHeld {
        trip_id: String,
        booking_id: Uuid,
        seats: Vec<String>,
        expires_at: i64,
        timestamp: i64,
    },
    SeatsReleased {
        trip_id: String,
        booking_id: Uuid,
        seats: Vec<String>,
        timestamp: i64,
    },
    BookingConfirmed {
        trip_id: String,
        booking_id: Uuid,
        reference: String,
        seats: Vec<String>,
        total_amount: i64,
        currency: String,
        timestamp: i64,
    },
    BookingCancelled {
        trip_id: String,
        booking_id: Uuid,
        reference: String,
        seats: Vec<String>,
        timestamp: i64,
    },
    BookingExpired {
        trip_id: String,
        booking_id: Uuid,
        reference: String,
        timestamp: i64,
    },
}

impl BookingEvent {
    pub fn trip_id(&self) -> &str {
        match self {
            BookingEvent::SeatsHeld { trip_id, .. }
            | BookingEvent::SeatsReleased { trip_id, .. }
            | BookingEvent::BookingConfirmed { trip_id, .. }
            | BookingEvent::BookingCancelled { trip_id, .. }
            | BookingEvent::BookingExpired { trip_id, .. } => trip_id,
        }
    }

    /// Name used for the SSE `event:` field and for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingEvent::SeatsHeld { .. } => "seats_held",
            BookingEvent::SeatsReleased { .. } => "seats_released",
            BookingEvent::BookingConfirmed { .. } => "booking_confirmed",
            BookingEvent::BookingCancelled { .. } => "booking_cancelled",
            BookingEvent::BookingExpired { .. } => "booking_expired",
        }
    }
}
