// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use shutter_core::{Clock, FakeClock, InvoiceStatus, NewBooking, NewInvoice};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

fn create(state: &mut MaterializedState, id: &str, start: DateTime<Utc>, clock: &FakeClock) {
    let request = NewBooking::new("studio-1", "cust-1", "svc-1", start);
    let (booking, _) = Booking::new(id, request, 60, clock);
    state.apply(&Operation::BookingCreate { booking });
}

fn transition(state: &mut MaterializedState, id: &str, to: BookingStatus, clock: &FakeClock) {
    let booking = state.booking(&BookingId::new(id)).unwrap();
    let (updated, _) = booking.transition(to, None, clock).unwrap();
    let op = Operation::booking_transition(&updated).unwrap();
    state.apply(&op);
}

#[test]
fn apply_booking_create_and_transition() {
    let clock = FakeClock::at(t0() - Duration::days(3));
    let mut state = MaterializedState::default();
    create(&mut state, "bk-1", t0(), &clock);

    clock.advance(Duration::hours(1));
    transition(&mut state, "bk-1", BookingStatus::Quoted, &clock);

    let booking = state.booking(&BookingId::new("bk-1")).unwrap();
    assert_eq!(booking.status, BookingStatus::Quoted);
    assert_eq!(booking.status_log.len(), 2);
    assert_eq!(booking.updated_at, clock.now());
}

#[test]
fn transition_for_unknown_booking_is_ignored() {
    let clock = FakeClock::at(t0());
    let mut state = MaterializedState::default();
    create(&mut state, "bk-1", t0(), &clock);
    let mut other = state.booking(&BookingId::new("bk-1")).unwrap().clone();
    other.id = BookingId::new("bk-404");
    let (updated, _) = other.transition(BookingStatus::Quoted, None, &clock).unwrap();

    state.apply(&Operation::booking_transition(&updated).unwrap());
    assert_eq!(state.bookings.len(), 1);
}

#[test]
fn apply_reschedule() {
    let clock = FakeClock::at(t0() - Duration::days(3));
    let mut state = MaterializedState::default();
    create(&mut state, "bk-1", t0(), &clock);

    state.apply(&Operation::BookingReschedule {
        id: BookingId::new("bk-1"),
        scheduled_at: t0() + Duration::hours(2),
        updated_at: clock.now(),
    });

    assert_eq!(
        state.booking(&BookingId::new("bk-1")).unwrap().scheduled_at,
        t0() + Duration::hours(2)
    );
}

#[test]
fn studio_bookings_are_ordered_by_start() {
    let clock = FakeClock::at(t0() - Duration::days(3));
    let mut state = MaterializedState::default();
    create(&mut state, "bk-late", t0() + Duration::hours(4), &clock);
    create(&mut state, "bk-early", t0(), &clock);

    let ids: Vec<_> = state
        .bookings_for_studio(&StudioId::new("studio-1"))
        .iter()
        .map(|b| b.id.to_string())
        .collect();
    assert_eq!(ids, vec!["bk-early", "bk-late"]);
    assert!(state.bookings_for_studio(&StudioId::new("studio-2")).is_empty());
}

#[test]
fn starting_between_filters_status_and_range() {
    let clock = FakeClock::at(t0() - Duration::days(3));
    let mut state = MaterializedState::default();
    create(&mut state, "bk-1", t0(), &clock);
    create(&mut state, "bk-2", t0() + Duration::days(5), &clock);
    create(&mut state, "bk-3", t0() + Duration::hours(1), &clock);
    for id in ["bk-1", "bk-2"] {
        transition(&mut state, id, BookingStatus::Quoted, &clock);
        transition(&mut state, id, BookingStatus::Confirmed, &clock);
    }

    let found = state.bookings_starting_between(
        BookingStatus::Confirmed,
        t0() - Duration::hours(1),
        t0() + Duration::hours(48),
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "bk-1");
}

#[test]
fn updated_between_is_half_open() {
    let clock = FakeClock::at(t0());
    let mut state = MaterializedState::default();
    create(&mut state, "bk-1", t0(), &clock);

    let at = state.booking(&BookingId::new("bk-1")).unwrap().updated_at;
    assert_eq!(
        state
            .bookings_updated_between(BookingStatus::Inquiry, at, at + Duration::hours(1))
            .len(),
        1
    );
    assert!(state
        .bookings_updated_between(BookingStatus::Inquiry, at - Duration::hours(1), at)
        .is_empty());
}

#[test]
fn apply_invoice_lifecycle_and_past_due_query() {
    let clock = FakeClock::at(t0() - Duration::days(10));
    let mut state = MaterializedState::default();
    let invoice = Invoice::new(
        "inv-1",
        NewInvoice::new("studio-1", "cust-1", 1_000).due(t0()),
        &clock,
    );
    state.apply(&Operation::InvoiceCreate {
        invoice: invoice.clone(),
    });
    assert!(state.invoices_past_due(t0() + Duration::hours(1)).is_empty());

    state.apply(&Operation::InvoiceStatusUpdate {
        id: invoice.id.clone(),
        status: InvoiceStatus::Sent,
        updated_at: clock.now(),
    });
    assert_eq!(state.invoices_past_due(t0() + Duration::hours(1)).len(), 1);
    assert!(state.invoices_past_due(t0()).is_empty());

    let sent = state.invoice(&invoice.id).unwrap().clone();
    let (paid, _) = sent.record_payment(1_000, &clock).unwrap();
    state.apply(&Operation::InvoicePayment {
        id: invoice.id.clone(),
        payment: paid.payments[0].clone(),
        status: paid.status,
    });
    let stored = state.invoice(&invoice.id).unwrap();
    assert_eq!(stored.status, InvoiceStatus::Paid);
    assert_eq!(stored.amount_paid(), 1_000);
    assert!(state.invoices_past_due(t0() + Duration::hours(1)).is_empty());
}
