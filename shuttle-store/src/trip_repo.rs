use async_trait::async_trait;
use chrono::NaiveDate;
use shuttle_core::{CatalogError, Trip, TripCatalog, TripId};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Trip catalog held in memory, usually loaded from a JSON file at start-up.
pub struct InMemoryTripCatalog {
    trips: HashMap<TripId, Trip>,
}

impl InMemoryTripCatalog {
    /// Build a catalog, rejecting duplicate ids and trips that break their invariants.
    pub fn from_trips(trips: Vec<Trip>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(trips.len());
        for trip in trips {
            trip.validate()?;
            if by_id.contains_key(&trip.id) {
                return Err(CatalogError::InvalidTrip(format!("duplicate trip id {}", trip.id)));
            }
            by_id.insert(trip.id.clone(), trip);
        }
        Ok(Self { trips: by_id })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let trips: Vec<Trip> =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidTrip(format!("malformed trips file: {}", e)))?;
        Self::from_trips(trips)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Storage(format!("reading {}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), trips = catalog.trips.len(), "trip catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
impl TripCatalog for InMemoryTripCatalog {
    async fn get_trip(&self, id: &TripId) -> Result<Option<Trip>, CatalogError> {
        Ok(self.trips.get(id).cloned())
    }

    async fn search(&self, origin: &str, destination: &str, date: NaiveDate) -> Result<Vec<Trip>, CatalogError> {
        Ok(self
            .trips
            .values()
            .filter(|t| same_place(&t.origin, origin) && same_place(&t.destination, destination))
            .filter(|t| t.departure.date_naive() == date)
            .cloned()
            .collect())
    }

    async fn all_trips(&self) -> Result<Vec<Trip>, CatalogError> {
        Ok(self.trips.values().cloned().collect())
    }
}
