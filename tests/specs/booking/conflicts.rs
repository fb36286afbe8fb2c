// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A studio slot can be held by only one active booking

use crate::prelude::*;
use shutter_core::{BookingStatus, ConflictMode, NewBooking};
use shutter_engine::BookingError;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_for_one_slot_admit_exactly_one() {
    let h = Harness::at(t() - hours(72));

    let mut handles = Vec::new();
    for customer in ["cust-a", "cust-b"] {
        let runtime = std::sync::Arc::clone(&h.runtime);
        handles.push(tokio::spawn(async move {
            runtime
                .service()
                .create_booking(
                    NewBooking::new(STUDIO, customer, SERVICE, t()),
                    ConflictMode::IntervalOverlap,
                )
                .await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let created: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(created.len(), 1);
    let conflict = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    match conflict {
        BookingError::SlotConflict { conflicting, .. } => {
            assert_eq!(conflicting, &created[0].id);
        }
        other => panic!("expected slot conflict, got {other:?}"),
    }

    let bookings = h
        .runtime
        .service()
        .bookings_for_studio(&STUDIO.into())
        .unwrap();
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn overlapping_request_is_rejected_but_exact_instant_mode_lets_it_through() {
    let h = Harness::at(t() - hours(72));
    h.booking(t(), BookingStatus::Inquiry).await;
    let half_past = t() + chrono::Duration::minutes(30);

    let overlap = h
        .runtime
        .service()
        .create_booking(
            NewBooking::new(STUDIO, "cust-2", SERVICE, half_past),
            ConflictMode::IntervalOverlap,
        )
        .await;
    assert!(matches!(overlap, Err(BookingError::SlotConflict { .. })));

    let exact = h
        .runtime
        .service()
        .create_booking(
            NewBooking::new(STUDIO, "cust-2", SERVICE, half_past),
            ConflictMode::ExactInstant,
        )
        .await;
    assert!(exact.is_ok());
}

#[tokio::test]
async fn cancelled_booking_frees_its_slot() {
    let h = Harness::at(t() - hours(72));
    let first = h.booking(t(), BookingStatus::Confirmed).await;
    h.runtime.service().cancel(&first.id, None).await.unwrap();

    let second = h
        .runtime
        .service()
        .create_booking(
            NewBooking::new(STUDIO, "cust-2", SERVICE, t()),
            ConflictMode::IntervalOverlap,
        )
        .await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn back_to_back_bookings_do_not_conflict() {
    let h = Harness::at(t() - hours(72));
    h.booking(t(), BookingStatus::Quoted).await;

    let next = h
        .runtime
        .service()
        .create_booking(
            NewBooking::new(STUDIO, "cust-2", SERVICE, t() + hours(1)),
            ConflictMode::IntervalOverlap,
        )
        .await;
    assert!(next.is_ok());
}
