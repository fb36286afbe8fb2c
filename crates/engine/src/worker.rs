// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job worker: re-checks subject state, dispatches, retries with backoff

use crate::scheduler::JobScheduler;
use chrono::{DateTime, Utc};
use shutter_adapters::{Notifier, NotifyError};
use shutter_core::{
    job::reminder_due_at, BookingId, BookingStatus, Clock, Counter, InvoiceId, JobKind, Metrics,
    ScheduledJob, WorkerConfig,
};
use shutter_storage::Store;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::Instrument;

/// What happened to a job on this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Dispatched,
    /// The subject no longer warrants the notification
    NoOp { reason: &'static str },
    Retrying { retry_at: DateTime<Utc> },
    /// Attempt budget spent; the job is dropped
    Abandoned { error: String },
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub job: ScheduledJob,
    pub outcome: JobOutcome,
}

enum Dispatch {
    Sent,
    Moot(&'static str),
}

pub struct JobWorker<N, C> {
    store: Arc<Store>,
    jobs: Arc<Mutex<JobScheduler>>,
    notifier: N,
    clock: C,
    metrics: Arc<Metrics>,
    dispatch_timeout: Duration,
}

impl<N: Notifier, C: Clock> JobWorker<N, C> {
    pub fn new(
        store: Arc<Store>,
        jobs: Arc<Mutex<JobScheduler>>,
        notifier: N,
        clock: C,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            jobs,
            notifier,
            clock,
            metrics,
            dispatch_timeout: WorkerConfig::default().dispatch_timeout,
        }
    }

    /// Bound each send; a send still pending after `timeout` is a failed attempt
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    /// Run every job due now, concurrently, and settle each one.
    ///
    /// Each send is bounded by the dispatch timeout, so the batch finishes
    /// even when a channel hangs. Reports come back in due order.
    pub async fn run_due(&self) -> Vec<JobReport> {
        let due = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .poll_due(self.clock.now());
        if due.is_empty() {
            return Vec::new();
        }

        let timeout = self.dispatch_timeout;
        let mut tasks = JoinSet::new();
        for (index, job) in due.iter().cloned().enumerate() {
            let store = Arc::clone(&self.store);
            let notifier = self.notifier.clone();
            let span = tracing::info_span!(
                "job",
                job_id = %job.id,
                kind = %job.kind,
                subject_id = %job.subject_id,
                attempt = job.attempts + 1,
            );
            tasks.spawn(
                async move {
                    let dispatch = execute(&store, &notifier, &job);
                    let result = match tokio::time::timeout(timeout, dispatch).await {
                        Ok(result) => result,
                        Err(_) => Err(NotifyError::TimedOut(timeout)),
                    };
                    (index, result)
                }
                .instrument(span),
            );
        }

        let mut results: Vec<Option<Result<Dispatch, NotifyError>>> =
            due.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Some(slot) = results.get_mut(index) {
                        *slot = Some(result);
                    }
                }
                Err(e) => tracing::error!(error = %e, "job task failed to complete"),
            }
        }

        due.into_iter()
            .zip(results)
            .map(|(job, result)| match result {
                Some(result) => self.settle(job, result),
                None => {
                    self.jobs
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .mark_finished(&job.key());
                    self.metrics.incr(Counter::JobAbandoned);
                    JobReport {
                        job,
                        outcome: JobOutcome::Abandoned {
                            error: "job task did not complete".to_string(),
                        },
                    }
                }
            })
            .collect()
    }

    fn settle(&self, job: ScheduledJob, result: Result<Dispatch, NotifyError>) -> JobReport {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let outcome = match result {
            Ok(Dispatch::Sent) => {
                jobs.mark_delivered(&job);
                self.metrics.incr(Counter::JobDispatched);
                tracing::info!(
                    job_id = %job.id,
                    kind = %job.kind,
                    subject_id = %job.subject_id,
                    "job dispatched"
                );
                JobOutcome::Dispatched
            }
            Ok(Dispatch::Moot(reason)) => {
                jobs.mark_finished(&job.key());
                self.metrics.incr(Counter::JobNoop);
                tracing::debug!(
                    job_id = %job.id,
                    kind = %job.kind,
                    subject_id = %job.subject_id,
                    reason,
                    "job no longer applies"
                );
                JobOutcome::NoOp { reason }
            }
            Err(e) => match jobs.retry(job.clone(), self.clock.now()) {
                Some(retry_at) => {
                    self.metrics.incr(Counter::JobRetried);
                    tracing::warn!(
                        job_id = %job.id,
                        kind = %job.kind,
                        attempt = job.attempts + 1,
                        retry_at = %retry_at,
                        error = %e,
                        "job failed, will retry"
                    );
                    JobOutcome::Retrying { retry_at }
                }
                None => {
                    self.metrics.incr(Counter::JobAbandoned);
                    tracing::error!(
                        job_id = %job.id,
                        kind = %job.kind,
                        subject_id = %job.subject_id,
                        attempts = job.attempts + 1,
                        error = %e,
                        "job abandoned"
                    );
                    JobOutcome::Abandoned {
                        error: e.to_string(),
                    }
                }
            },
        };
        JobReport { job, outcome }
    }
}

/// Re-fetch the job's subject and dispatch only if it still applies
async fn execute<N: Notifier>(
    store: &Store,
    notifier: &N,
    job: &ScheduledJob,
) -> Result<Dispatch, NotifyError> {
    match job.kind {
        JobKind::BookingReminder => {
            let id = BookingId::new(job.subject_id.as_str());
            let Some(booking) = store.read(|state| state.booking(&id).cloned()) else {
                return Ok(Dispatch::Moot("booking not found"));
            };
            if booking.status != BookingStatus::Confirmed {
                return Ok(Dispatch::Moot("booking not confirmed"));
            }
            if reminder_due_at(booking.scheduled_at) != job.first_due_at {
                return Ok(Dispatch::Moot("booking was rescheduled"));
            }
            notifier.send_booking_reminder(&booking).await?;
        }
        JobKind::PaymentReminder => {
            let id = InvoiceId::new(job.subject_id.as_str());
            let Some(invoice) = store.read(|state| state.invoice(&id).cloned()) else {
                return Ok(Dispatch::Moot("invoice not found"));
            };
            if invoice.status.is_settled() {
                return Ok(Dispatch::Moot("invoice settled"));
            }
            notifier.send_payment_reminder(&invoice).await?;
        }
        JobKind::FollowUp => {
            let id = BookingId::new(job.subject_id.as_str());
            let Some(booking) = store.read(|state| state.booking(&id).cloned()) else {
                return Ok(Dispatch::Moot("booking not found"));
            };
            if booking.status != BookingStatus::Completed {
                return Ok(Dispatch::Moot("booking not completed"));
            }
            notifier.send_follow_up(&booking).await?;
        }
    }
    Ok(Dispatch::Sent)
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
