use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::BookingId;
use crate::error::PaymentError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Pending,
}

/// Settlement details embedded in a confirmed booking. Written once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    /// Provider's transaction id (e.g. a Paystack reference).
    pub provider_txn_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
    pub settled_at: DateTime<Utc>,
}

/// A provider-delivered notification about the payment for one booking.
/// Providers deliver at least once; `event_id` identifies redeliveries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEvent {
    pub event_id: String,
    /// The callback reference the payment link was created with.
    pub booking_id: BookingId,
    pub status: PaymentStatus,
    pub provider_txn_id: String,
    pub amount: i64,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

impl PaymentEvent {
    pub fn record(&self) -> PaymentRecord {
        PaymentRecord {
            provider_txn_id: self.provider_txn_id.clone(),
            status: self.status,
            amount: self.amount,
            currency: self.currency.clone(),
            settled_at: self.occurred_at,
        }
    }
}

/// Redirect target handed to the customer to complete payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentLink {
    pub authorization_url: String,
    pub booking_id: BookingId,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted payment page for `amount`; the provider will call back
    /// with `booking_id` as the reference.
    async fn create_link(
        &self,
        booking_id: BookingId,
        amount: i64,
        currency: &str,
        customer_email: &str,
    ) -> Result<PaymentLink, PaymentError>;
}
