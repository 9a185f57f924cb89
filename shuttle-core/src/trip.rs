use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TripId {
    fn from(value: &str) -> Self {
        TripId(value.to_string())
    }
}

/// Seat label as printed on the vehicle's seat map ("1", "2A", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub String);

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeatId {
    fn from(value: &str) -> Self {
        SeatId(value.to_string())
    }
}

/// A scheduled vehicle run as published by the trip catalog.
///
/// `booked_seats` is the snapshot the catalog was seeded with. Once the trip is
/// registered with the seat inventory, the inventory owns the live booked set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub vehicle_type: String,
    pub capacity: u32,
    /// Fare per seat in minor units.
    pub base_fare: i64,
    pub currency: String,
    pub seat_ids: Vec<SeatId>,
    #[serde(default)]
    pub booked_seats: BTreeSet<SeatId>,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Trip {
    pub fn summary(&self) -> TripSummary {
        TripSummary {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure: self.departure,
            arrival: self.arrival,
        }
    }

    pub fn has_seat(&self, seat: &SeatId) -> bool {
        self.seat_ids.contains(seat)
    }

    /// Check the structural invariants a catalog record must satisfy before it
    /// can back an inventory.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.seat_ids.is_empty() {
            return Err(CatalogError::InvalidTrip(format!("trip {} has no seats", self.id)));
        }

        let unique: HashSet<&SeatId> = self.seat_ids.iter().collect();
        if unique.len() != self.seat_ids.len() {
            return Err(CatalogError::InvalidTrip(format!(
                "trip {} lists a seat more than once",
                self.id
            )));
        }

        if u32::try_from(self.seat_ids.len()).ok() != Some(self.capacity) {
            return Err(CatalogError::InvalidTrip(format!(
                "trip {} has capacity {} but {} seats",
                self.id,
                self.capacity,
                self.seat_ids.len()
            )));
        }

        if let Some(seat) = self.booked_seats.iter().find(|s| !unique.contains(s)) {
            return Err(CatalogError::InvalidTrip(format!(
                "trip {} marks unknown seat {} as booked",
                self.id, seat
            )));
        }

        if self.arrival < self.departure {
            return Err(CatalogError::InvalidTrip(format!(
                "trip {} arrives before it departs",
                self.id
            )));
        }

        Ok(())
    }
}

/// Trip details denormalized onto a booking for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripSummary {
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
}
