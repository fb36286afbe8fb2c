// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use crate::scheduler::{JobScheduler, ScheduleOutcome};
use chrono::{DateTime, Utc};
use shutter_adapters::{Notifier, NotifyError};
use shutter_core::{Booking, BookingId, BookingStatus, Effect, Event, WorkerConfig};
use shutter_storage::Store;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),
}

/// Performs the effects requested by booking and invoice transitions
pub struct Executor<N> {
    notifier: N,
    store: Arc<Store>,
    jobs: Arc<Mutex<JobScheduler>>,
    dispatch_timeout: Duration,
    /// Status-update sends still in flight
    sends: Mutex<JoinSet<()>>,
}

impl<N: Notifier> Executor<N> {
    pub fn new(notifier: N, store: Arc<Store>, jobs: Arc<Mutex<JobScheduler>>) -> Self {
        Self {
            notifier,
            store,
            jobs,
            dispatch_timeout: WorkerConfig::default().dispatch_timeout,
            sends: Mutex::new(JoinSet::new()),
        }
    }

    /// Bound each status-update send
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn jobs(&self) -> &Arc<Mutex<JobScheduler>> {
        &self.jobs
    }

    /// Execute a single effect with tracing.
    ///
    /// Returns the scheduling outcome for `ScheduleJob` effects. Status
    /// updates are handed to a background send and never awaited here.
    pub async fn execute(
        &self,
        effect: Effect,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduleOutcome>, ExecuteError> {
        let span = tracing::info_span!("effect", effect = effect.name());
        async move {
            let result = self.execute_inner(effect, now);
            if let Err(e) = &result {
                tracing::warn!(error = %e, "effect failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Execute effects, logging and skipping failures.
    ///
    /// Jobs are scheduled before any notification goes out. The transition
    /// that produced the effects is already persisted, so nothing here may
    /// fail it.
    pub async fn execute_all(
        &self,
        effects: Vec<Effect>,
        now: DateTime<Utc>,
    ) -> Vec<ScheduleOutcome> {
        let (schedules, emits): (Vec<_>, Vec<_>) = effects
            .into_iter()
            .partition(|effect| matches!(effect, Effect::ScheduleJob { .. }));

        let mut outcomes = Vec::new();
        for effect in schedules.into_iter().chain(emits) {
            if let Ok(Some(outcome)) = self.execute(effect, now).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for every status-update send started so far
    pub async fn flush_notifications(&self) {
        let mut sends = {
            let mut guard = self.sends.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        while let Some(joined) = sends.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "status update task failed to complete");
            }
        }
    }

    fn execute_inner(
        &self,
        effect: Effect,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduleOutcome>, ExecuteError> {
        match effect {
            Effect::Emit(event) => {
                tracing::info!(event = event.name(), "emitted");
                if let Event::BookingStatusChanged { id, from, to } = event {
                    let booking = self
                        .store
                        .read(|state| state.booking(&id).cloned())
                        .ok_or(ExecuteError::BookingNotFound(id))?;
                    self.spawn_status_update(booking, from, to);
                }
                Ok(None)
            }

            Effect::ScheduleJob {
                kind,
                subject_id,
                due_at,
            } => {
                let outcome = self
                    .jobs
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .schedule(kind, subject_id, due_at, now);
                Ok(Some(outcome))
            }
        }
    }

    fn spawn_status_update(&self, booking: Booking, from: BookingStatus, to: BookingStatus) {
        let notifier = self.notifier.clone();
        let timeout = self.dispatch_timeout;
        let span = tracing::info_span!(
            "status_update",
            booking_id = %booking.id,
            from = %from,
            to = %to,
        );
        let send = async move {
            let delivery = notifier.send_booking_status_update(&booking, from, to);
            let result = match tokio::time::timeout(timeout, delivery).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::TimedOut(timeout)),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "status update not delivered");
            }
        };

        let mut sends = self.sends.lock().unwrap_or_else(|e| e.into_inner());
        while sends.try_join_next().is_some() {}
        sends.spawn(send.instrument(span));
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
