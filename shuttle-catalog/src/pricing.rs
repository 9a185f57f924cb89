use serde::{Deserialize, Serialize};
use shuttle_core::{Trip, TripId};

/// Fare breakdown shown before the customer commits to a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareQuote {
    pub trip_id: TripId,
    pub seat_count: u32,
    /// Per-seat fare in minor units
    pub unit_fare: i64,
    pub booking_fee: i64,
    pub total_amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat fee per booking, in minor units
    pub booking_fee: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { booking_fee: 0 }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("At least one seat is required for a quote")]
    NoSeats,

    #[error("Fare overflow for {seats} seats on trip {trip_id}")]
    Overflow { trip_id: TripId, seats: u32 },
}

/// Fixed-fare pricing: every seat on a trip costs its base fare.
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn quote(&self, trip: &Trip, seat_count: u32) -> Result<FareQuote, PricingError> {
        if seat_count == 0 {
            return Err(PricingError::NoSeats);
        }

        let overflow = || PricingError::Overflow {
            trip_id: trip.id.clone(),
            seats: seat_count,
        };
        let total_amount = trip
            .base_fare
            .checked_mul(i64::from(seat_count))
            .and_then(|fare| fare.checked_add(self.config.booking_fee))
            .ok_or_else(overflow)?;

        Ok(FareQuote {
            trip_id: trip.id.clone(),
            seat_count,
            unit_fare: trip.base_fare,
            booking_fee: self.config.booking_fee,
            total_amount,
            currency: trip.currency.clone(),
        })
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use shuttle_core::SeatId;
    use std::collections::BTreeSet;

    fn trip(base_fare: i64) -> Trip {
        let departure = Utc.with_ymd_and_hms(2026, 12, 24, 9, 30, 0).unwrap();
        Trip {
            id: TripId::from("LHR-CL-0930"),
            origin: "Heathrow Airport (LHR)".to_string(),
            destination: "Central London".to_string(),
            departure,
            arrival: departure + Duration::minutes(75),
            vehicle_type: "Executive Van".to_string(),
            capacity: 2,
            base_fare,
            currency: "GBP".to_string(),
            seat_ids: vec![SeatId::from("1"), SeatId::from("2")],
            booked_seats: BTreeSet::new(),
            stops: 1,
            amenities: vec!["WiFi".to_string()],
        }
    }

    #[test]
    fn test_quote_multiplies_base_fare() {
        let engine = PricingEngine::default();
        let quote = engine.quote(&trip(2550), 3).unwrap();
        assert_eq!(quote.total_amount, 7650);
        assert_eq!(quote.unit_fare, 2550);
        assert_eq!(quote.currency, "GBP");
    }

    #[test]
    fn test_quote_adds_booking_fee() {
        let engine = PricingEngine::new(PricingConfig { booking_fee: 150 });
        let quote = engine.quote(&trip(1000), 2).unwrap();
        assert_eq!(quote.total_amount, 2150);
    }

    #[test]
    fn test_quote_rejects_zero_seats() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(&trip(1000), 0), Err(PricingError::NoSeats));
    }

    #[test]
    fn test_quote_overflow() {
        let engine = PricingEngine::default();
        let result = engine.quote(&trip(i64::MAX), 2);
        assert!(matches!(result, Err(PricingError::Overflow { .. })));
    }
}
