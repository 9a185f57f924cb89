use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use shuttle_core::{Booking, PaymentEvent};
use shuttle_order::CallbackOutcome;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(payment_webhook))
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
}

/// POST /v1/webhooks/payments
///
/// Retryable failures answer 5xx so the provider redelivers; everything else
/// is final for that event id.
async fn payment_webhook(
    State(state): State<AppState>,
    Json(event): Json<PaymentEvent>,
) -> Result<Json<WebhookResponse>, AppError> {
    let result = state.callbacks.handle(event).await;

    let response = match result {
        Ok(CallbackOutcome::Confirmed(booking)) => {
            state.metrics.confirmations.inc();
            WebhookResponse {
                outcome: "confirmed",
                booking: Some(booking),
            }
        }
        Ok(CallbackOutcome::Expired(booking)) => WebhookResponse {
            outcome: "expired",
            booking: Some(booking),
        },
        Ok(CallbackOutcome::Duplicate) => WebhookResponse {
            outcome: "duplicate",
            booking: None,
        },
        Ok(CallbackOutcome::Ignored(_)) => WebhookResponse {
            outcome: "ignored",
            booking: None,
        },
        Err(e) => {
            state.metrics.payment_callbacks.with_label_values(&["error"]).inc();
            return Err(e.into());
        }
    };

    state.metrics.payment_callbacks.with_label_values(&[response.outcome]).inc();
    Ok(Json(response))
}
