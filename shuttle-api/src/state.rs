use anyhow::Context;
use shuttle_catalog::{InMemorySeatInventory, PricingConfig, PricingEngine};
use shuttle_core::{Clock, EventPublisher, PaymentProvider, SeatInventory, TripCatalog};
use shuttle_order::{
    InMemoryBookingLedger, PaymentCallbackHandler, PaymentOrchestrator, QueryService,
    RandomReferenceGenerator, ReservationManager,
};
use shuttle_store::app_config::BusinessRules;
use shuttle_store::{BroadcastEventPublisher, Config};
use std::sync::Arc;

use crate::metrics::Metrics;
use crate::middleware::resiliency::ResiliencyState;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ReservationManager>,
    pub callbacks: Arc<PaymentCallbackHandler>,
    pub payments: Arc<PaymentOrchestrator>,
    pub query: Arc<QueryService>,
    pub events: BroadcastEventPublisher,
    pub metrics: Arc<Metrics>,
    pub resiliency: Arc<ResiliencyState>,
    pub business_rules: BusinessRules,
}

impl AppState {
    /// Wire the in-memory stores and services, and load every catalog trip
    /// into the seat inventory.
    pub async fn build(
        config: &Config,
        catalog: Arc<dyn TripCatalog>,
        provider: Arc<dyn PaymentProvider>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let rules = config.business_rules.clone();

        let inventory = Arc::new(InMemorySeatInventory::new(clock.clone()));
        let trips = catalog.all_trips().await.context("failed to read trip catalog")?;
        for trip in &trips {
            inventory
                .register_trip(trip)
                .await
                .with_context(|| format!("failed to register trip {}", trip.id))?;
        }
        tracing::info!(trips = trips.len(), "seat inventory loaded");

        let references = Arc::new(RandomReferenceGenerator::new(rules.reference_prefix.trim()));
        let ledger = Arc::new(InMemoryBookingLedger::new(clock.clone(), references));
        let events = BroadcastEventPublisher::default();
        let hold_ttl = chrono::Duration::seconds(
            i64::try_from(rules.hold_ttl_seconds).context("business_rules.hold_ttl_seconds is too large")?,
        );

        let manager = Arc::new(ReservationManager::new(
            catalog.clone(),
            inventory.clone(),
            ledger.clone(),
            Arc::new(events.clone()) as Arc<dyn EventPublisher>,
            clock.clone(),
            hold_ttl,
        ));
        let query = QueryService::new(
            catalog,
            inventory,
            ledger.clone(),
            PricingEngine::new(PricingConfig {
                booking_fee: rules.booking_fee,
            }),
        );

        Ok(Self {
            callbacks: Arc::new(PaymentCallbackHandler::new(manager.clone(), clock)),
            payments: Arc::new(PaymentOrchestrator::new(ledger, provider)),
            query: Arc::new(query),
            manager,
            events,
            metrics: Arc::new(Metrics::new()?),
            resiliency: Arc::new(ResiliencyState::from_config(&config.payment)),
            business_rules: rules,
        })
    }
}
