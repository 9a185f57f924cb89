use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::trip::{SeatId, Trip, TripId};

#[derive(Debug, Clone, Deserialize)]
pub struct TripSearchRequest {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub passengers: u32,
}

impl TripSearchRequest {
    /// Searching for a route that starts where it ends never matches anything.
    pub fn is_round_trip_to_self(&self) -> bool {
        self.origin.trim().eq_ignore_ascii_case(self.destination.trim())
    }
}

/// One search hit: catalog data plus live availability.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripOption {
    pub trip_id: TripId,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub vehicle_type: String,
    pub stops: u32,
    pub amenities: Vec<String>,
    pub capacity: u32,
    pub available_seats: u32,
    pub base_fare: i64,
    pub currency: String,
}

impl TripOption {
    pub fn from_trip(trip: &Trip, available_seats: u32) -> Self {
        Self {
            trip_id: trip.id.clone(),
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            departure: trip.departure,
            arrival: trip.arrival,
            vehicle_type: trip.vehicle_type.clone(),
            stops: trip.stops,
            amenities: trip.amenities.clone(),
            capacity: trip.capacity,
            available_seats,
            base_fare: trip.base_fare,
            currency: trip.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Available,
    Held,
    Booked,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeatMapEntry {
    pub seat_id: SeatId,
    pub state: SeatState,
}

/// Per-seat availability in the trip's seat order, for the seat picker.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeatMap {
    pub trip_id: TripId,
    pub seats: Vec<SeatMapEntry>,
}

impl SeatMap {
    pub fn available_count(&self) -> usize {
        self.seats.iter().filter(|s| s.state == SeatState::Available).count()
    }
}
