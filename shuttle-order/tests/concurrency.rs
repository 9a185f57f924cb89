mod common;

use common::*;
use shuttle_core::{BookingStatus, SeatId, SeatInventory, TripId, UserId};
use shuttle_order::ReservationError;
use std::collections::HashSet;

/// Seat "5" is the last free seat on T1. A and B race for it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_race_and_resale_after_cancel() {
    let h = harness().await;

    let a = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.reserve(request("T1", &["5"], Some("a"))).await })
    };
    let b = {
        let manager = h.manager.clone();
        tokio::spawn(async move { manager.reserve(request("T1", &["5"], Some("b"))).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let (winner, loser) = match (a, b) {
        (Ok(w), Err(l)) | (Err(l), Ok(w)) => (w, l),
        (a, b) => panic!("expected exactly one winner, got {:?} and {:?}", a, b),
    };
    match loser {
        ReservationError::SeatsUnavailable { seats, .. } => assert_eq!(seats, vec![SeatId::from("5")]),
        other => panic!("loser should see SeatsUnavailable, got {other}"),
    }

    let confirmed = h.manager.confirm(winner.id, payment_for(&winner, "txn_w")).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(available(&h, "T1").await.is_empty());

    let owner = winner.user_id.clone().unwrap();
    let cancelled = h.manager.cancel(winner.id, Some(&owner)).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(available(&h, "T1").await.contains(&SeatId::from("5")));

    let other = if owner == UserId::from("a") { "b" } else { "a" };
    let retried = h.manager.reserve(request("T1", &["5"], Some(other))).await.unwrap();
    assert_eq!(retried.status, BookingStatus::Pending);
}

/// Many overlapping requests on one trip never double-allocate a seat.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_overlapping_holds_never_exceed_capacity() {
    let h = harness().await;
    let selections: Vec<Vec<&'static str>> = vec![
        vec!["1", "2"],
        vec!["2", "3"],
        vec!["3", "4"],
        vec!["4", "1"],
        vec!["1"],
        vec!["2"],
        vec!["3"],
        vec!["4"],
        vec!["1", "3"],
        vec!["2", "4"],
    ];

    let mut handles = Vec::new();
    for round in 0..4 {
        for seats in &selections {
            let manager = h.manager.clone();
            let seats = seats.clone();
            let user = format!("user-{}", round);
            handles.push(tokio::spawn(async move {
                manager.reserve(request("T2", &seats, Some(user.as_str()))).await
            }));
        }
    }

    let mut held: Vec<SeatId> = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => held.extend(booking.seats),
            Err(ReservationError::SeatsUnavailable { .. }) => {}
            Err(e) => panic!("unexpected error {e}"),
        }
    }

    let unique: HashSet<&SeatId> = held.iter().collect();
    assert_eq!(unique.len(), held.len(), "a seat was allocated twice");
    assert!(held.len() <= 4);

    let map = h.inventory.seat_map(&TripId::from("T2")).await.unwrap();
    assert_eq!(map.available_count() + held.len(), 4);
}

/// Confirmations delivered concurrently for the same payment settle once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_confirmations() {
    let h = harness().await;
    let booking = h.manager.reserve(request("T2", &["1", "2"], None)).await.unwrap();
    let payment = payment_for(&booking, "txn_dup");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = h.manager.clone();
        let payment = payment.clone();
        handles.push(tokio::spawn(async move { manager.confirm(booking.id, payment).await }));
    }
    for handle in handles {
        let confirmed = handle.await.unwrap().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    assert_eq!(available(&h, "T2").await.len(), 2);
}

/// A cancel racing its own retry releases the seats exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_release_once() {
    let h = harness().await;
    let booking = h.manager.reserve(request("T2", &["3"], None)).await.unwrap();
    h.manager.confirm(booking.id, payment_for(&booking, "txn")).await.unwrap();

    // Another customer takes seat 4 meanwhile; it must stay theirs.
    let other = h.manager.reserve(request("T2", &["4"], None)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let manager = h.manager.clone();
        handles.push(tokio::spawn(async move { manager.cancel(booking.id, None).await }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(ReservationError::InvalidState { .. }) => {}
            Err(e) => panic!("unexpected error {e}"),
        }
    }
    assert_eq!(ok, 1);

    let free = available(&h, "T2").await;
    assert!(free.contains(&SeatId::from("3")));
    assert!(!free.contains(&SeatId::from("4")));
    assert_eq!(h.ledger_booking(other.id).await.status, BookingStatus::Pending);
}
