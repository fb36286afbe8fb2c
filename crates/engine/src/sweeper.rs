// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation sweeps that re-derive jobs the delayed path may have missed

use crate::error::BookingError;
use crate::executor::Executor;
use chrono::{DateTime, Duration, Utc};
use shutter_adapters::Notifier;
use shutter_core::config::to_chrono;
use shutter_core::job::{follow_up_due_at, reminder_due_at};
use shutter_core::{
    BookingStatus, Clock, Counter, InvoiceId, InvoiceStatus, JobKey, JobKind, Metrics, Operation,
    SweepConfig,
};
use shutter_storage::Store;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepKind {
    /// Hourly: reminders for confirmed bookings in the next horizon
    UpcomingBookings,
    /// Daily: mark past-due invoices overdue and remind
    OverdueInvoices,
    /// Daily: follow-ups for bookings completed about a day ago
    CompletedBookings,
}

impl SweepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SweepKind::UpcomingBookings => "upcoming_bookings",
            SweepKind::OverdueInvoices => "overdue_invoices",
            SweepKind::CompletedBookings => "completed_bookings",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one sweep run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub kind: SweepKind,
    pub examined: usize,
    pub scheduled: usize,
    /// Already covered by a pending or delivered job, or moot
    pub skipped: usize,
    pub marked_overdue: usize,
    pub failed: usize,
}

impl SweepReport {
    fn new(kind: SweepKind) -> Self {
        Self {
            kind,
            examined: 0,
            scheduled: 0,
            skipped: 0,
            marked_overdue: 0,
            failed: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    fire_at: DateTime<Utc>,
    kind: SweepKind,
    interval: Duration,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.kind == other.kind
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first
        Reverse(self.fire_at).cmp(&Reverse(other.fire_at))
    }
}

/// Repeating timers that decide when each sweep is due
#[derive(Default)]
pub struct SweepTimers {
    items: BinaryHeap<Timer>,
}

impl SweepTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three sweeps, first firing at `now`
    pub fn from_config(config: &SweepConfig, now: DateTime<Utc>) -> Self {
        let mut timers = Self::new();
        timers.schedule_repeating(
            SweepKind::UpcomingBookings,
            now,
            to_chrono(config.upcoming_interval),
        );
        timers.schedule_repeating(
            SweepKind::OverdueInvoices,
            now,
            to_chrono(config.overdue_interval),
        );
        timers.schedule_repeating(
            SweepKind::CompletedBookings,
            now,
            to_chrono(config.completed_interval),
        );
        timers
    }

    pub fn schedule_repeating(
        &mut self,
        kind: SweepKind,
        fire_at: DateTime<Utc>,
        interval: Duration,
    ) {
        self.items.push(Timer {
            fire_at,
            kind,
            interval,
        });
    }

    /// Sweeps due at or before `now`.
    ///
    /// Each fires at most once per poll; after downtime the next firing is
    /// moved past `now` instead of replaying every missed cycle.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<SweepKind> {
        let mut ready = Vec::new();

        while let Some(item) = self.items.peek() {
            if item.fire_at > now {
                break;
            }
            let Some(item) = self.items.pop() else {
                break;
            };

            if item.interval > Duration::zero() {
                let mut next = item.fire_at + item.interval;
                while next <= now {
                    next += item.interval;
                }
                self.items.push(Timer {
                    fire_at: next,
                    ..item.clone()
                });
            }

            ready.push(item.kind);
        }

        ready
    }

    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.items.peek().map(|item| item.fire_at)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub struct Sweeper<N, C> {
    store: Arc<Store>,
    executor: Arc<Executor<N>>,
    clock: C,
    config: SweepConfig,
    metrics: Arc<Metrics>,
}

impl<N: Notifier, C: Clock> Sweeper<N, C> {
    pub fn new(
        store: Arc<Store>,
        executor: Arc<Executor<N>>,
        clock: C,
        config: SweepConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            executor,
            clock,
            config,
            metrics,
        }
    }

    pub async fn run(&self, kind: SweepKind) -> SweepReport {
        let span = tracing::info_span!("sweep", kind = %kind);
        async move {
            let report = match kind {
                SweepKind::UpcomingBookings => self.sweep_upcoming(),
                SweepKind::OverdueInvoices => self.sweep_overdue().await,
                SweepKind::CompletedBookings => self.sweep_completed(),
            };

            self.metrics.incr(Counter::SweepRun);
            tracing::info!(
                examined = report.examined,
                scheduled = report.scheduled,
                skipped = report.skipped,
                marked_overdue = report.marked_overdue,
                failed = report.failed,
                "sweep finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Reminders for CONFIRMED bookings starting within the horizon.
    ///
    /// A booking is skipped when a reminder is still pending or the
    /// reminder for its current start time was already delivered.
    pub fn sweep_upcoming(&self) -> SweepReport {
        let now = self.clock.now();
        let until = now + to_chrono(self.config.upcoming_horizon);
        let bookings: Vec<_> = self.store.read(|state| {
            state
                .bookings_starting_between(BookingStatus::Confirmed, now, until)
                .into_iter()
                .map(|b| (b.id.clone(), b.scheduled_at))
                .collect()
        });

        let mut report = SweepReport::new(SweepKind::UpcomingBookings);
        let mut jobs = self
            .executor
            .jobs()
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for (id, scheduled_at) in bookings {
            report.examined += 1;
            let due_at = reminder_due_at(scheduled_at);
            let key = JobKey::new(JobKind::BookingReminder, id.as_str());
            if jobs.has_pending(&key) || jobs.last_delivered(&key) == Some(due_at) {
                report.skipped += 1;
                continue;
            }
            if jobs
                .schedule(JobKind::BookingReminder, id.as_str(), due_at, now)
                .is_scheduled()
            {
                report.scheduled += 1;
            } else {
                report.skipped += 1;
            }
        }
        report
    }

    /// Mark past-due invoices OVERDUE and queue a payment reminder for each.
    ///
    /// Invoices that already have a reminder pending are not given another.
    pub async fn sweep_overdue(&self) -> SweepReport {
        let now = self.clock.now();
        let candidates: Vec<InvoiceId> = self.store.read(|state| {
            state
                .invoices_past_due(now)
                .into_iter()
                .map(|i| i.id.clone())
                .collect()
        });

        let mut report = SweepReport::new(SweepKind::OverdueInvoices);
        for id in candidates {
            report.examined += 1;

            let marked = self.store.write(|state| {
                let Some(invoice) = state.invoice(&id) else {
                    return Ok((Vec::new(), None));
                };
                if !invoice.is_past_due(now) || invoice.status == InvoiceStatus::Overdue {
                    return Ok((Vec::new(), None));
                }
                let (updated, effects) = invoice.mark_overdue(&self.clock)?;
                let op = Operation::InvoiceStatusUpdate {
                    id: updated.id.clone(),
                    status: updated.status,
                    updated_at: updated.updated_at,
                };
                Ok::<_, BookingError>((vec![op], Some(effects)))
            });
            match marked {
                Ok(Some(effects)) => {
                    report.marked_overdue += 1;
                    self.executor.execute_all(effects, now).await;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        invoice_id = %id,
                        error = %e,
                        "failed to mark invoice overdue"
                    );
                    continue;
                }
            }

            let mut jobs = self
                .executor
                .jobs()
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let key = JobKey::new(JobKind::PaymentReminder, id.as_str());
            if jobs.has_pending(&key) {
                report.skipped += 1;
            } else if jobs
                .schedule(JobKind::PaymentReminder, id.as_str(), now, now)
                .is_scheduled()
            {
                report.scheduled += 1;
            }
        }
        report
    }

    /// Follow-ups for bookings whose completion landed in
    /// `[now - window_start, now - window_end)`.
    ///
    /// Bookings that fall outside the window during downtime are never
    /// picked up.
    pub fn sweep_completed(&self) -> SweepReport {
        let now = self.clock.now();
        let from = now - to_chrono(self.config.completed_window_start);
        let to = now - to_chrono(self.config.completed_window_end);
        let bookings: Vec<_> = self.store.read(|state| {
            state
                .bookings_updated_between(BookingStatus::Completed, from, to)
                .into_iter()
                .map(|b| b.id.clone())
                .collect()
        });

        let mut report = SweepReport::new(SweepKind::CompletedBookings);
        let mut jobs = self
            .executor
            .jobs()
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for id in bookings {
            report.examined += 1;
            let key = JobKey::new(JobKind::FollowUp, id.as_str());
            if jobs.has_pending(&key) || jobs.last_delivered(&key).is_some() {
                report.skipped += 1;
                continue;
            }
            if jobs
                .schedule(JobKind::FollowUp, id.as_str(), follow_up_due_at(now), now)
                .is_scheduled()
            {
                report.scheduled += 1;
            }
        }
        report
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
