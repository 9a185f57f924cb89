use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shuttle_core::{Booking, BookingId, PassengerDetails, PaymentLink, SeatId, TripId};
use shuttle_order::{ReservationError, ReserveRequest};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{AuthenticatedUser, Requester};
use crate::middleware::resiliency::payment_circuit_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let payment_link = Router::new()
        .route("/v1/bookings/{id}/payment-link", post(create_payment_link))
        .route_layer(axum::middleware::from_fn_with_state(state, payment_circuit_middleware));

    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_my_bookings))
        .route("/v1/bookings/reference/{reference}", get(booking_by_reference))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .merge(payment_link)
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub trip_id: String,
    pub seats: Vec<String>,
    pub passenger: PassengerDetails,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

/// POST /v1/bookings
///
/// The amount is quoted here from the trip fare; clients never send it.
async fn create_booking(
    State(state): State<AppState>,
    Requester(user): Requester,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let trip_id = TripId(req.trip_id);
    let seat_count = u32::try_from(req.seats.len()).map_err(|_| AppError::validation("too many seats"))?;
    let quote = state.query.quote(&trip_id, seat_count).await?;

    let result = state
        .manager
        .reserve(ReserveRequest {
            trip_id,
            seats: req.seats.into_iter().map(SeatId).collect(),
            passenger: req.passenger,
            total_amount: quote.total_amount,
            user_id: user,
        })
        .await;

    let outcome = match &result {
        Ok(_) => "held",
        Err(ReservationError::SeatsUnavailable { .. }) => "unavailable",
        Err(_) => "rejected",
    };
    state.metrics.reservations.with_label_values(&[outcome]).inc();

    Ok((StatusCode::CREATED, Json(result?)))
}

/// POST /v1/bookings/{id}/payment-link
async fn create_payment_link(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentLink>, AppError> {
    let link = state.payments.create_payment_link(BookingId(id), user.as_ref()).await?;
    Ok(Json(link))
}

/// GET /v1/bookings/reference/{reference}
async fn booking_by_reference(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.query.booking_by_reference(&reference).await?;
    Ok(Json(booking))
}

/// GET /v1/bookings
async fn list_my_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<BookingListResponse>, AppError> {
    let bookings = state.query.bookings_for_user(&user).await?;
    Ok(Json(BookingListResponse { bookings }))
}

/// POST /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.manager.cancel(BookingId(id), user.as_ref()).await?;
    state.metrics.cancellations.inc();
    Ok(Json(booking))
}
