use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shuttle_store::app_config::PaymentConfig;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    /// Failing fast until `reset_timeout` has passed.
    Open,
    /// Letting a single trial request through to test the upstream.
    HalfOpen,
}

pub struct CircuitBreaker {
    pub name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    opened_at: RwLock<Option<Instant>>,
    trial_in_flight: AtomicBool,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout,
            opened_at: RwLock::new(None),
            trial_in_flight: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a call may go upstream now. While half-open only one call is
    /// admitted until it is recorded.
    pub async fn check(&self) -> bool {
        match *self.state.read().await {
            CircuitState::Closed => return true,
            CircuitState::HalfOpen => return self.start_trial(),
            CircuitState::Open => {}
        }

        let cooled_down = self
            .opened_at
            .read()
            .await
            .map(|at| at.elapsed() >= self.reset_timeout)
            .unwrap_or(false);
        if !cooled_down {
            return false;
        }

        let mut state = self.state.write().await;
        match *state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => self.start_trial(),
            CircuitState::Open => {
                *state = CircuitState::HalfOpen;
                self.trial_in_flight.store(true, Ordering::SeqCst);
                tracing::info!(breaker = %self.name, "circuit half-open");
                true
            }
        }
    }

    fn start_trial(&self) -> bool {
        self.trial_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!(breaker = %self.name, "circuit closed after successful trial request");
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
        self.trial_in_flight.store(false, Ordering::SeqCst);
    }

    /// A response that says nothing about upstream health; frees the half-open slot.
    pub fn record_neutral(&self) {
        self.trial_in_flight.store(false, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            if *state != CircuitState::Open {
                tracing::error!(breaker = %self.name, failures = count, "circuit open");
            }
            *state = CircuitState::Open;
            *self.opened_at.write().await = Some(Instant::now());
        }
        self.trial_in_flight.store(false, Ordering::SeqCst);
    }
}

/// Breakers guarding outbound dependencies.
pub struct ResiliencyState {
    pub payment_cb: CircuitBreaker,
}

impl ResiliencyState {
    pub fn from_config(payment: &PaymentConfig) -> Self {
        Self {
            payment_cb: CircuitBreaker::new(
                "payment-provider",
                payment.failure_threshold as usize,
                Duration::from_secs(payment.reset_timeout_seconds),
            ),
        }
    }
}

/// Wraps the payment-link route. Upstream 5xx responses count as failures;
/// client errors say nothing about provider health and are not counted.
pub async fn payment_circuit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let cb = &state.resiliency.payment_cb;
    if !cb.check().await {
        return AppError::ServiceUnavailable(format!("{} is temporarily unavailable", cb.name)).into_response();
    }

    let response = next.run(req).await;
    let status = response.status();
    if status.is_server_error() {
        cb.record_failure().await;
    } else if status.is_success() {
        cb.record_success().await;
    } else {
        cb.record_neutral();
    }
    response
}
