use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use shuttle_core::{SeatMap, TripId};
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{trip_id}/seats", get(seat_map))
        .route("/v1/trips/{trip_id}/stream", get(seat_stream))
}

/// GET /v1/trips/{trip_id}/seats
async fn seat_map(State(state): State<AppState>, Path(trip_id): Path<String>) -> Result<Json<SeatMap>, AppError> {
    let map = state.query.seat_map(&TripId(trip_id)).await?;
    Ok(Json(map))
}

/// GET /v1/trips/{trip_id}/stream
///
/// Live seat and booking events for one trip. Clients that fall behind miss
/// events and should re-read the seat map.
async fn seat_stream(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // 404 for unknown trips before opening the stream.
    state.query.seat_map(&TripId(trip_id.clone())).await?;

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(move |result| {
        let trip_id = trip_id.clone();
        async move {
            match result {
                Ok(event) if event.trip_id() == trip_id => match Event::default().event(event.kind()).json_data(&event) {
                    Ok(sse) => Some(Ok::<_, Infallible>(sse)),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode booking event");
                        None
                    }
                },
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(trip_id = %trip_id, skipped, "seat stream subscriber lagged");
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
