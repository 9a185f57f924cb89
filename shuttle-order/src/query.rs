use shuttle_catalog::{FareQuote, PricingEngine, PricingError};
use shuttle_core::{
    Booking, BookingLedger, CatalogError, InventoryError, LedgerError, SeatInventory, SeatMap,
    TripCatalog, TripId, TripOption, TripSearchRequest, UserId,
};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Catalog(CatalogError),

    #[error(transparent)]
    Inventory(InventoryError),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<CatalogError> for QueryError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::TripNotFound(id) => QueryError::NotFound(format!("trip {}", id)),
            other => QueryError::Catalog(other),
        }
    }
}

impl From<InventoryError> for QueryError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::TripNotFound(id) => QueryError::NotFound(format!("trip {}", id)),
            other => QueryError::Inventory(other),
        }
    }
}

impl From<LedgerError> for QueryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(reference) => QueryError::NotFound(format!("booking {}", reference)),
            other => QueryError::Ledger(other),
        }
    }
}

impl From<PricingError> for QueryError {
    fn from(err: PricingError) -> Self {
        QueryError::InvalidRequest(err.to_string())
    }
}

/// Read-only views over trips, seats and bookings.
pub struct QueryService {
    catalog: Arc<dyn TripCatalog>,
    inventory: Arc<dyn SeatInventory>,
    ledger: Arc<dyn BookingLedger>,
    pricing: PricingEngine,
}

impl QueryService {
    pub fn new(
        catalog: Arc<dyn TripCatalog>,
        inventory: Arc<dyn SeatInventory>,
        ledger: Arc<dyn BookingLedger>,
        pricing: PricingEngine,
    ) -> Self {
        Self {
            catalog,
            inventory,
            ledger,
            pricing,
        }
    }

    /// Trips on the route and day with at least `passengers` seats free right now.
    pub async fn search_trips(&self, request: &TripSearchRequest) -> Result<Vec<TripOption>, QueryError> {
        if request.passengers == 0 {
            return Err(QueryError::InvalidRequest("passengers must be at least 1".to_string()));
        }
        if request.is_round_trip_to_self() {
            debug!(origin = %request.origin, "origin equals destination, nothing to search");
            return Ok(Vec::new());
        }

        let trips = self
            .catalog
            .search(&request.origin, &request.destination, request.date)
            .await?;

        let mut options = Vec::with_capacity(trips.len());
        for trip in trips {
            let available = match self.inventory.available_seats(&trip.id).await {
                Ok(seats) => seats.len() as u32,
                Err(InventoryError::TripNotFound(_)) => {
                    warn!(trip_id = %trip.id, "catalog trip is not tracked by inventory");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if available >= request.passengers {
                options.push(TripOption::from_trip(&trip, available));
            }
        }
        Ok(options)
    }

    pub async fn seat_map(&self, trip_id: &TripId) -> Result<SeatMap, QueryError> {
        Ok(self.inventory.seat_map(trip_id).await?)
    }

    pub async fn quote(&self, trip_id: &TripId, seat_count: u32) -> Result<FareQuote, QueryError> {
        let trip = self
            .catalog
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| QueryError::NotFound(format!("trip {}", trip_id)))?;
        Ok(self.pricing.quote(&trip, seat_count)?)
    }

    pub async fn booking_by_reference(&self, reference: &str) -> Result<Booking, QueryError> {
        Ok(self.ledger.get_by_reference(reference).await?)
    }

    /// Newest first.
    pub async fn bookings_for_user(&self, user: &UserId) -> Result<Vec<Booking>, QueryError> {
        Ok(self.ledger.list_by_user(user).await?)
    }
}
