use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shuttle_order::{QueryError, ReservationError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError { code: &'static str, message: String },
    NotFoundError(String),
    ConflictError { code: &'static str, message: String },
    UpstreamError(String),
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, "UNAUTHORIZED", msg),
            AppError::ValidationError { code, message } => (StatusCode::UNPROCESSABLE_ENTITY, code, message),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::ConflictError { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::UpstreamError(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", "Payment provider unavailable".to_string())
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err {
            ReservationError::SeatsUnavailable { .. } => AppError::ConflictError {
                code: "SEATS_UNAVAILABLE",
                message,
            },
            ReservationError::HoldExpired(_) => AppError::ConflictError {
                code: "HOLD_EXPIRED",
                message,
            },
            ReservationError::InvalidState { .. } => AppError::ConflictError {
                code: "INVALID_STATE",
                message,
            },
            // Never say whether the booking exists.
            ReservationError::Unauthorized => AppError::AuthorizationError(message),
            ReservationError::NotFound(_) => AppError::NotFoundError(message),
            ReservationError::InvalidSeats(_) => AppError::ValidationError {
                code: "INVALID_SEATS",
                message,
            },
            ReservationError::InvalidAmount(_) => AppError::ValidationError {
                code: "INVALID_AMOUNT",
                message,
            },
            ReservationError::InvalidPayment(_) => AppError::ValidationError {
                code: "INVALID_PAYMENT",
                message,
            },
            ReservationError::PaymentMismatch { .. } => AppError::ValidationError {
                code: "PAYMENT_MISMATCH",
                message,
            },
            ReservationError::Payment(_) => AppError::UpstreamError(message),
            ReservationError::CompensationFailed { .. }
            | ReservationError::Inventory(_)
            | ReservationError::Ledger(_)
            | ReservationError::Catalog(_) => AppError::InternalServerError(message),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        let message = err.to_string();
        match err {
            QueryError::NotFound(_) => AppError::NotFoundError(message),
            QueryError::InvalidRequest(_) => AppError::validation(message),
            QueryError::Catalog(_) | QueryError::Inventory(_) | QueryError::Ledger(_) => {
                AppError::InternalServerError(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle_core::{BookingId, BookingStatus, SeatId, TripId};

    fn status(err: ReservationError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_reservation_error_status_mapping() {
        assert_eq!(
            status(ReservationError::SeatsUnavailable {
                trip_id: TripId::from("T1"),
                seats: vec![SeatId::from("5")],
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ReservationError::HoldExpired(BookingId::new())), StatusCode::CONFLICT);
        assert_eq!(
            status(ReservationError::InvalidState {
                booking_id: BookingId::new(),
                status: BookingStatus::Pending,
                action: "cancelled",
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ReservationError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(status(ReservationError::NotFound("booking x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ReservationError::InvalidSeats("none".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(ReservationError::CompensationFailed {
                original: "a".into(),
                compensation: "b".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
