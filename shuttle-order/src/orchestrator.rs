use async_trait::async_trait;
use shuttle_core::{
    BookingId, BookingLedger, BookingStatus, PaymentError, PaymentLink, PaymentProvider, UserId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::manager::ReservationError;

/// Hands pending bookings to the payment provider. Runs outside any trip lock.
pub struct PaymentOrchestrator {
    ledger: Arc<dyn BookingLedger>,
    provider: Arc<dyn PaymentProvider>,
}

impl PaymentOrchestrator {
    pub fn new(ledger: Arc<dyn BookingLedger>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { ledger, provider }
    }

    /// Create a payment link for a pending booking. The booking id is the
    /// callback reference the provider will report back.
    pub async fn create_payment_link(
        &self,
        booking_id: BookingId,
        requester: Option<&UserId>,
    ) -> Result<PaymentLink, ReservationError> {
        let Some(booking) = self.ledger.get(booking_id).await? else {
            warn!(booking_id = %booking_id, "payment link requested for unknown booking");
            return Err(ReservationError::Unauthorized);
        };

        if !booking.is_owned_by(requester) {
            return Err(ReservationError::Unauthorized);
        }
        if booking.status != BookingStatus::Pending {
            return Err(ReservationError::InvalidState {
                booking_id,
                status: booking.status,
                action: "paid",
            });
        }

        let link = self
            .provider
            .create_link(
                booking.id,
                booking.total_amount,
                &booking.currency,
                booking.passenger.email.expose(),
            )
            .await
            .map_err(|e| {
                warn!(booking_id = %booking_id, error = %e, "payment provider rejected link request");
                e
            })?;

        info!(booking_id = %booking_id, reference = %booking.reference, amount = booking.total_amount, "payment link created");
        Ok(link)
    }
}

/// Stand-in provider that builds a hosted checkout URL without calling out.
pub struct MockPaymentProvider {
    checkout_url: String,
    outage: AtomicBool,
}

impl MockPaymentProvider {
    pub fn new(checkout_url: impl Into<String>) -> Self {
        Self {
            checkout_url: checkout_url.into(),
            outage: AtomicBool::new(false),
        }
    }

    /// Make every following call fail, as if the gateway were down.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_link(
        &self,
        booking_id: BookingId,
        amount: i64,
        currency: &str,
        _customer_email: &str,
    ) -> Result<PaymentLink, PaymentError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(PaymentError::Provider("Simulated payment gateway outage".to_string()));
        }
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        Ok(PaymentLink {
            authorization_url: format!("{}?trxref={}", self.checkout_url, booking_id),
            booking_id,
            amount,
            currency: currency.to_string(),
        })
    }
}
