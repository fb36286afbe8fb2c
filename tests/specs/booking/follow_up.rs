// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completed bookings get one follow-up a day later

use crate::prelude::*;
use shutter_adapters::NotifyCall;
use shutter_core::{Booking, BookingStatus, JobKind};
use shutter_engine::SweepKind;

async fn complete_at(h: &Harness, booking: &Booking, at: chrono::DateTime<chrono::Utc>) {
    h.clock.set(at);
    for status in [BookingStatus::InProgress, BookingStatus::Completed] {
        h.runtime
            .service()
            .transition(&booking.id, status, None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn completed_booking_gets_one_follow_up() {
    let h = Harness::at(t() - hours(30));
    let booking = h.booking(t(), BookingStatus::Confirmed).await;
    complete_at(&h, &booking, t() + hours(1)).await;

    let queued = h.queued(JobKind::FollowUp);
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].due_at, t() + hours(25));

    h.clock.set(t() + hours(25));
    h.runtime.tick().await;
    h.clock.set(t() + hours(40));
    h.runtime.tick().await;

    let follow_ups: Vec<_> = h
        .reminders_sent()
        .into_iter()
        .filter(|call| matches!(call, NotifyCall::FollowUp { .. }))
        .collect();
    assert_eq!(
        follow_ups,
        vec![NotifyCall::FollowUp {
            booking_id: booking.id
        }]
    );
}

#[tokio::test]
async fn completed_sweep_recovers_a_lost_follow_up() {
    let h = Harness::at(t() - hours(30));
    let booking = h.booking(t(), BookingStatus::Confirmed).await;
    complete_at(&h, &booking, t() + hours(1)).await;

    // Drop everything queued, as a restart would
    {
        let mut jobs = h.runtime.jobs().lock().unwrap();
        for job in jobs.poll_due(t() + hours(1000)) {
            jobs.mark_finished(&job.key());
        }
        assert!(jobs.is_empty());
    }

    h.clock.set(t() + hours(31));
    let report = h.runtime.tick().await;

    let completed = report
        .sweeps
        .iter()
        .find(|s| s.kind == SweepKind::CompletedBookings)
        .unwrap();
    assert_eq!(completed.scheduled, 1);
    let queued = h.queued(JobKind::FollowUp);
    assert_eq!(queued[0].due_at, t() + hours(55));
    assert!(h.reminders_sent().is_empty());

    h.clock.set(t() + hours(55));
    h.runtime.tick().await;

    assert_eq!(
        h.reminders_sent(),
        vec![NotifyCall::FollowUp {
            booking_id: booking.id
        }]
    );
}
