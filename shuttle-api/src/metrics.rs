use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Booking counters, registered on a registry owned by the app state.
pub struct Metrics {
    registry: Registry,
    pub reservations: IntCounterVec,
    pub confirmations: IntCounter,
    pub cancellations: IntCounter,
    pub expirations: IntCounter,
    pub payment_callbacks: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new_custom(Some("shuttle".to_string()), None)?;

        let reservations = IntCounterVec::new(
            Opts::new("reservations_total", "Reservation attempts by outcome"),
            &["outcome"],
        )?;
        let confirmations = IntCounter::new("confirmations_total", "Bookings confirmed")?;
        let cancellations = IntCounter::new("cancellations_total", "Bookings cancelled")?;
        let expirations = IntCounter::new("expirations_total", "Bookings expired by the hold sweep")?;
        let payment_callbacks = IntCounterVec::new(
            Opts::new("payment_callbacks_total", "Payment callbacks by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(reservations.clone()))?;
        registry.register(Box::new(confirmations.clone()))?;
        registry.register(Box::new(cancellations.clone()))?;
        registry.register(Box::new(expirations.clone()))?;
        registry.register(Box::new(payment_callbacks.clone()))?;

        Ok(Self {
            registry,
            reservations,
            confirmations,
            cancellations,
            expirations,
            payment_callbacks,
        })
    }

    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
