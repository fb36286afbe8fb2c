// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime that wires the booking service, worker and sweeper together

use crate::executor::Executor;
use crate::scheduler::JobScheduler;
use crate::service::BookingService;
use crate::sweeper::{SweepReport, SweepTimers, Sweeper};
use crate::worker::{JobReport, JobWorker};
use chrono::{DateTime, Utc};
use shutter_adapters::Notifier;
use shutter_core::{Clock, Config, IdGen, Metrics};
use shutter_storage::Store;
use std::sync::{Arc, Mutex};

/// Runtime adapter dependencies
pub struct RuntimeDeps<N> {
    pub notifier: N,
    pub store: Arc<Store>,
    pub metrics: Arc<Metrics>,
}

/// Work done by one `tick`
#[derive(Debug, Default)]
pub struct TickReport {
    pub sweeps: Vec<SweepReport>,
    pub jobs: Vec<JobReport>,
}

/// The single scheduler process: one booking service, one job queue, one
/// worker and the periodic sweeps
pub struct Runtime<N, C, I> {
    service: BookingService<N, C, I>,
    worker: JobWorker<N, C>,
    sweeper: Sweeper<N, C>,
    timers: Mutex<SweepTimers>,
    jobs: Arc<Mutex<JobScheduler>>,
    metrics: Arc<Metrics>,
    clock: C,
}

impl<N, C, I> Runtime<N, C, I>
where
    N: Notifier,
    C: Clock,
    I: IdGen,
{
    /// Create a runtime; every sweep first fires on the first tick
    pub fn new(deps: RuntimeDeps<N>, config: &Config, clock: C, id_gen: I) -> Self {
        let jobs = Arc::new(Mutex::new(JobScheduler::new(
            config.jobs.clone(),
            Arc::clone(&deps.metrics),
        )));
        let dispatch_timeout = config.worker.dispatch_timeout;
        let executor = Arc::new(
            Executor::new(
                deps.notifier.clone(),
                Arc::clone(&deps.store),
                Arc::clone(&jobs),
            )
            .with_dispatch_timeout(dispatch_timeout),
        );

        Self {
            service: BookingService::new(
                Arc::clone(&deps.store),
                Arc::clone(&executor),
                clock.clone(),
                id_gen,
                config.studio_hours.clone(),
            ),
            worker: JobWorker::new(
                Arc::clone(&deps.store),
                Arc::clone(&jobs),
                deps.notifier,
                clock.clone(),
                Arc::clone(&deps.metrics),
            )
            .with_dispatch_timeout(dispatch_timeout),
            timers: Mutex::new(SweepTimers::from_config(&config.sweeps, clock.now())),
            sweeper: Sweeper::new(
                deps.store,
                executor,
                clock.clone(),
                config.sweeps.clone(),
                Arc::clone(&deps.metrics),
            ),
            jobs,
            metrics: deps.metrics,
            clock,
        }
    }

    pub fn service(&self) -> &BookingService<N, C, I> {
        &self.service
    }

    pub fn sweeper(&self) -> &Sweeper<N, C> {
        &self.sweeper
    }

    pub fn worker(&self) -> &JobWorker<N, C> {
        &self.worker
    }

    pub fn jobs(&self) -> &Arc<Mutex<JobScheduler>> {
        &self.jobs
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run due sweeps, then every due job
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let due_sweeps = self
            .timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .poll(now);

        let mut report = TickReport::default();
        for kind in due_sweeps {
            report.sweeps.push(self.sweeper.run(kind).await);
        }
        report.jobs = self.worker.run_due().await;
        report
    }

    /// Wait for status-update notifications still in flight
    pub async fn flush_notifications(&self) {
        self.service.flush_notifications().await;
    }

    /// Earliest instant at which a sweep or job becomes due
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        let sweep = self
            .timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .next_fire_time();
        let job = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .next_due();
        match (sweep, job) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
