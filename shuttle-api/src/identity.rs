use axum::{extract::FromRequestParts, http::request::Parts};
use shuttle_core::UserId;
use std::convert::Infallible;

use crate::error::AppError;

/// Header set by the upstream authentication gateway. This service never
/// verifies identities, it only compares them.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_from_parts(parts: &Parts) -> Option<UserId> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(UserId::from)
}

/// The calling user, or `None` for guests.
#[derive(Debug, Clone)]
pub struct Requester(pub Option<UserId>);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Requester(user_from_parts(parts)))
    }
}

/// A signed-in user; guests are rejected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::AuthenticationError("Sign in to view your bookings".to_string()))
    }
}
