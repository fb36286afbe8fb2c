// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for behavioral specs

use chrono::{DateTime, Duration, TimeZone, Utc};
use shutter_adapters::{FakeNotifier, NotifyCall};
use shutter_core::{
    Booking, BookingStatus, Config, ConflictMode, FakeClock, JobKind, Metrics, NewBooking,
    SequentialIdGen, Service, Studio,
};
use shutter_engine::{Runtime, RuntimeDeps};
use shutter_storage::Store;
use std::sync::Arc;

pub const STUDIO: &str = "studio-1";
pub const SERVICE: &str = "svc-portrait";

/// The appointment instant most scenarios revolve around
pub fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

pub fn hours(n: i64) -> Duration {
    Duration::hours(n)
}

pub type SpecRuntime = Runtime<FakeNotifier, FakeClock, SequentialIdGen>;

pub struct Harness {
    pub runtime: Arc<SpecRuntime>,
    pub notifier: FakeNotifier,
    pub clock: FakeClock,
}

impl Harness {
    /// A runtime at `now` with one studio offering a 60 minute service
    pub fn at(now: DateTime<Utc>) -> Self {
        let notifier = FakeNotifier::new();
        let clock = FakeClock::at(now);
        let runtime = Runtime::new(
            RuntimeDeps {
                notifier: notifier.clone(),
                store: Arc::new(Store::in_memory()),
                metrics: Arc::new(Metrics::new().unwrap()),
            },
            &Config::default(),
            clock.clone(),
            SequentialIdGen::new("bk"),
        );
        runtime
            .service()
            .register_studio(Studio::new(STUDIO, "North Light"))
            .unwrap();
        runtime
            .service()
            .register_service(Service::new(SERVICE, STUDIO, "Portrait session", 60))
            .unwrap();
        Self {
            runtime: Arc::new(runtime),
            notifier,
            clock,
        }
    }

    /// Create a booking at `start` and walk it to `status`
    pub async fn booking(&self, start: DateTime<Utc>, status: BookingStatus) -> Booking {
        let service = self.runtime.service();
        let mut booking = service
            .create_booking(
                NewBooking::new(STUDIO, "cust-1", SERVICE, start),
                ConflictMode::IntervalOverlap,
            )
            .await
            .unwrap();
        let path = [
            BookingStatus::Quoted,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ];
        for step in path {
            if booking.status == status {
                break;
            }
            booking = service.transition(&booking.id, step, None).await.unwrap();
        }
        assert_eq!(booking.status, status);
        booking
    }

    /// Queued jobs of `kind`
    pub fn queued(&self, kind: JobKind) -> Vec<shutter_core::ScheduledJob> {
        self.runtime
            .jobs()
            .lock()
            .unwrap()
            .queued()
            .into_iter()
            .filter(|job| job.kind == kind)
            .collect()
    }

    /// Notifications other than status updates
    pub fn reminders_sent(&self) -> Vec<NotifyCall> {
        self.notifier
            .calls()
            .into_iter()
            .filter(|call| !matches!(call, NotifyCall::StatusUpdate { .. }))
            .collect()
    }
}
