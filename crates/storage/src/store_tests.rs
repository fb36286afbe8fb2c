// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use shutter_core::{
    Booking, BookingId, ConflictMode, FakeClock, NewBooking, SlotRequest, Studio, StudioId,
};

#[derive(Debug)]
enum TestError {
    Conflict,
    Storage,
}

impl From<StorageError> for TestError {
    fn from(_: StorageError) -> Self {
        TestError::Storage
    }
}

fn booking(id: &str) -> Booking {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
    let clock = FakeClock::at(start - chrono::Duration::days(1));
    let request = NewBooking::new("studio-1", "cust-1", "svc-1", start);
    Booking::new(id, request, 60, &clock).0
}

fn insert_unless_conflict(store: &Store, candidate: Booking) -> Result<BookingId, TestError> {
    store.write(|state| {
        let request = SlotRequest::new(
            candidate.studio_id.clone(),
            candidate.scheduled_at,
            candidate.duration_minutes,
            ConflictMode::IntervalOverlap,
        );
        if shutter_core::has_conflict(state.bookings.values(), &request) {
            return Err(TestError::Conflict);
        }
        let id = candidate.id.clone();
        Ok((vec![Operation::BookingCreate { booking: candidate }], id))
    })
}

#[test]
fn failed_decision_leaves_store_untouched() {
    let store = Store::in_memory();
    insert_unless_conflict(&store, booking("bk-1")).unwrap();

    let result = insert_unless_conflict(&store, booking("bk-2"));
    assert!(matches!(result, Err(TestError::Conflict)));
    assert_eq!(store.read(|s| s.bookings.len()), 1);
}

#[test]
fn concurrent_writers_cannot_both_pass_the_check() {
    let store = Arc::new(Store::in_memory());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                insert_unless_conflict(&store, booking(&format!("bk-{}", i)))
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(store.read(|s| s.bookings.len()), 1);
}

#[test]
fn wal_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal").join("events.wal");

    {
        let store = Store::open(&path).unwrap();
        store
            .apply(vec![Operation::StudioUpsert {
                studio: Studio::new("studio-1", "Daylight"),
            }])
            .unwrap();
        insert_unless_conflict(&store, booking("bk-1")).unwrap();
    }

    let store = Store::open(&path).unwrap();
    let state = store.snapshot();
    assert!(state.studios.contains_key(&StudioId::new("studio-1")));
    assert!(state.bookings.contains_key(&BookingId::new("bk-1")));
}

#[test]
fn queries_are_counted_and_slow_ones_flagged() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let store = Store::in_memory().with_metrics(Arc::clone(&metrics), Duration::ZERO);

    store.read(|s| s.bookings.len());
    store.apply(Vec::new()).unwrap();
    // Make sure some time elapses inside the read
    store.read(|_| std::thread::sleep(Duration::from_millis(2)));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.store_reads, 2);
    assert_eq!(snapshot.store_writes, 1);
    assert!(snapshot.slow_queries >= 1);

    metrics.reset();
    assert_eq!(metrics.snapshot().store_reads, 0);
}
