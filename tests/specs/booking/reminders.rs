// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking reminders fire 24h ahead and re-check the booking when they run

use crate::prelude::*;
use shutter_adapters::NotifyCall;
use shutter_core::{BookingStatus, ConflictMode, JobKind};
use shutter_engine::JobOutcome;

#[tokio::test]
async fn confirmed_booking_gets_one_reminder() {
    let h = Harness::at(t() - hours(30));
    let booking = h.booking(t(), BookingStatus::Confirmed).await;

    let queued = h.queued(JobKind::BookingReminder);
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].due_at, t() - hours(24));

    h.clock.set(t() - hours(24));
    let report = h.runtime.tick().await;

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].outcome, JobOutcome::Dispatched);
    assert_eq!(
        h.reminders_sent(),
        vec![NotifyCall::BookingReminder {
            booking_id: booking.id
        }]
    );

    // Later ticks neither resend nor let the sweep re-enqueue it
    h.clock.set(t() - hours(22));
    let later = h.runtime.tick().await;
    assert!(later.jobs.is_empty());
    assert_eq!(h.reminders_sent().len(), 1);
}

#[tokio::test]
async fn cancelled_booking_reminder_is_a_no_op() {
    let h = Harness::at(t() - hours(30));
    let booking = h.booking(t(), BookingStatus::Confirmed).await;

    h.clock.set(t() - hours(25));
    h.runtime
        .service()
        .cancel(&booking.id, Some("customer called".to_string()))
        .await
        .unwrap();

    h.clock.set(t() - hours(24));
    let report = h.runtime.tick().await;

    assert_eq!(report.jobs.len(), 1);
    assert_eq!(
        report.jobs[0].outcome,
        JobOutcome::NoOp {
            reason: "booking not confirmed"
        }
    );
    assert!(h.reminders_sent().is_empty());
}

#[tokio::test]
async fn rescheduled_booking_is_reminded_for_new_time_only() {
    let h = Harness::at(t() - hours(30));
    let booking = h.booking(t(), BookingStatus::Confirmed).await;

    h.clock.set(t() - hours(29));
    let new_start = t() + hours(24);
    h.runtime
        .service()
        .reschedule(&booking.id, new_start, ConflictMode::IntervalOverlap)
        .await
        .unwrap();

    h.clock.set(t() - hours(24));
    let report = h.runtime.tick().await;
    assert_eq!(
        report.jobs[0].outcome,
        JobOutcome::NoOp {
            reason: "booking was rescheduled"
        }
    );
    assert!(h.reminders_sent().is_empty());

    h.clock.set(new_start - hours(24));
    h.runtime.tick().await;
    assert_eq!(
        h.reminders_sent(),
        vec![NotifyCall::BookingReminder {
            booking_id: booking.id
        }]
    );
}

#[tokio::test]
async fn booking_confirmed_inside_reminder_lead_gets_none() {
    let h = Harness::at(t() - hours(2));
    h.booking(t(), BookingStatus::Confirmed).await;

    assert!(h.queued(JobKind::BookingReminder).is_empty());

    h.runtime.tick().await;
    assert!(h.reminders_sent().is_empty());
}
