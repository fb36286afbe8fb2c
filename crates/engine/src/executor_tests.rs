// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};
use shutter_adapters::{FakeNotifier, NotifyCall};
use shutter_core::{
    Booking, BookingStatus, FakeClock, JobKind, Metrics, NewBooking, Operation, RetryPolicy,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

fn setup() -> (Executor<FakeNotifier>, FakeNotifier, Arc<Store>) {
    let notifier = FakeNotifier::new();
    let store = Arc::new(Store::in_memory());
    let jobs = Arc::new(Mutex::new(JobScheduler::new(
        RetryPolicy::default(),
        Arc::new(Metrics::new().unwrap()),
    )));
    let executor = Executor::new(notifier.clone(), Arc::clone(&store), jobs);
    (executor, notifier, store)
}

fn stored_quoted_booking(store: &Store) -> Booking {
    let clock = FakeClock::at(t0());
    let (booking, _) = Booking::new(
        "bk-1",
        NewBooking::new("studio-1", "cust-1", "svc-1", t0() + Duration::days(3)),
        60,
        &clock,
    );
    let (quoted, _) = booking
        .transition(BookingStatus::Quoted, None, &clock)
        .unwrap();
    store
        .apply(vec![Operation::BookingCreate {
            booking: quoted.clone(),
        }])
        .unwrap();
    quoted
}

#[tokio::test]
async fn schedule_job_effect_enqueues() {
    let (executor, _, _) = setup();
    let due = t0() + Duration::hours(2);

    let outcome = executor
        .execute(
            Effect::ScheduleJob {
                kind: JobKind::BookingReminder,
                subject_id: "bk-1".to_string(),
                due_at: due,
            },
            t0(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Some(ScheduleOutcome::Scheduled(_))));
    let jobs = executor.jobs().lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs.next_due(), Some(due));
}

#[tokio::test]
async fn status_change_notifies_customer() {
    let (executor, notifier, store) = setup();
    let booking = stored_quoted_booking(&store);

    executor
        .execute(
            Effect::Emit(Event::BookingStatusChanged {
                id: booking.id.clone(),
                from: BookingStatus::Inquiry,
                to: BookingStatus::Quoted,
            }),
            t0(),
        )
        .await
        .unwrap();
    executor.flush_notifications().await;

    assert_eq!(
        notifier.calls(),
        vec![NotifyCall::StatusUpdate {
            booking_id: booking.id,
            from: BookingStatus::Inquiry,
            to: BookingStatus::Quoted,
        }]
    );
}

#[tokio::test]
async fn other_events_are_only_logged() {
    let (executor, notifier, _) = setup();

    let outcome = executor
        .execute(
            Effect::Emit(Event::InvoiceSent {
                id: "inv-1".into(),
            }),
            t0(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, None);
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn execute_all_continues_past_failures() {
    let (executor, notifier, store) = setup();
    let booking = stored_quoted_booking(&store);
    notifier.set_failing(true);

    let outcomes = executor
        .execute_all(
            vec![
                Effect::Emit(Event::BookingStatusChanged {
                    id: booking.id.clone(),
                    from: BookingStatus::Inquiry,
                    to: BookingStatus::Quoted,
                }),
                Effect::Emit(Event::BookingStatusChanged {
                    id: "missing".into(),
                    from: BookingStatus::Inquiry,
                    to: BookingStatus::Quoted,
                }),
                Effect::ScheduleJob {
                    kind: JobKind::FollowUp,
                    subject_id: booking.id.to_string(),
                    due_at: t0() + Duration::hours(24),
                },
            ],
            t0(),
        )
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_scheduled());
    assert_eq!(executor.jobs().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn status_change_for_unknown_booking_fails() {
    let (executor, _, _) = setup();

    let result = executor
        .execute(
            Effect::Emit(Event::BookingStatusChanged {
                id: "ghost".into(),
                from: BookingStatus::Inquiry,
                to: BookingStatus::Quoted,
            }),
            t0(),
        )
        .await;

    assert!(matches!(result, Err(ExecuteError::BookingNotFound(_))));
}

#[tokio::test]
async fn status_updates_report_the_event_not_the_stored_status() {
    let (executor, notifier, store) = setup();
    let booking = stored_quoted_booking(&store);

    // Stored booking stays Quoted while both events are handled
    executor
        .execute_all(
            vec![
                Effect::Emit(Event::BookingStatusChanged {
                    id: booking.id.clone(),
                    from: BookingStatus::Inquiry,
                    to: BookingStatus::Quoted,
                }),
                Effect::Emit(Event::BookingStatusChanged {
                    id: booking.id.clone(),
                    from: BookingStatus::Quoted,
                    to: BookingStatus::Confirmed,
                }),
            ],
            t0(),
        )
        .await;
    executor.flush_notifications().await;

    let calls = notifier.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&NotifyCall::StatusUpdate {
        booking_id: booking.id.clone(),
        from: BookingStatus::Inquiry,
        to: BookingStatus::Quoted,
    }));
    assert!(calls.contains(&NotifyCall::StatusUpdate {
        booking_id: booking.id,
        from: BookingStatus::Quoted,
        to: BookingStatus::Confirmed,
    }));
}

#[tokio::test]
async fn hung_status_update_does_not_hold_up_scheduling() {
    let (executor, notifier, store) = setup();
    let executor = executor.with_dispatch_timeout(std::time::Duration::from_millis(50));
    let booking = stored_quoted_booking(&store);
    notifier.stall(booking.id.as_str());

    let outcomes = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        executor.execute_all(
            vec![
                Effect::Emit(Event::BookingStatusChanged {
                    id: booking.id.clone(),
                    from: BookingStatus::Quoted,
                    to: BookingStatus::Confirmed,
                }),
                Effect::ScheduleJob {
                    kind: JobKind::BookingReminder,
                    subject_id: booking.id.to_string(),
                    due_at: t0() + Duration::days(2),
                },
            ],
            t0(),
        ),
    )
    .await
    .expect("execute_all must not wait on the send");

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_scheduled());
    assert_eq!(executor.jobs().lock().unwrap().len(), 1);

    // The stalled send gives up after the dispatch timeout
    tokio::time::timeout(std::time::Duration::from_secs(1), executor.flush_notifications())
        .await
        .expect("stalled send is bounded by the dispatch timeout");
    assert!(notifier.calls().is_empty());
}
