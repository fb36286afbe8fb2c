// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process delayed job queue with a delivery ledger

use chrono::{DateTime, Utc};
use shutter_core::{Counter, JobId, JobKey, JobKind, Metrics, RetryPolicy, ScheduledJob};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

/// Result of a `schedule` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(JobId),
    /// Intentionally not enqueued; not an error
    Skipped { reason: &'static str },
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled(_))
    }
}

#[derive(Debug)]
struct QueuedJob {
    job: ScheduledJob,
    /// Insertion order; ties on `due_at` run first-in first-out
    seq: u64,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest first
        Reverse((self.job.due_at, self.seq)).cmp(&Reverse((other.job.due_at, other.seq)))
    }
}

/// Priority queue of notification jobs keyed by due time.
///
/// Scheduling is not idempotent: two calls for the same subject create two
/// jobs. The ledger (`has_pending`, `last_delivered`) lets the sweeper fill
/// gaps without piling on duplicates; the worker's state re-check covers the
/// rest.
pub struct JobScheduler {
    queue: BinaryHeap<QueuedJob>,
    next_seq: u64,
    /// Jobs queued or in flight per subject
    pending: HashMap<JobKey, usize>,
    /// Original due time of the last successfully delivered job per subject
    delivered: HashMap<JobKey, DateTime<Utc>>,
    policy: RetryPolicy,
    metrics: Arc<Metrics>,
}

impl JobScheduler {
    pub fn new(policy: RetryPolicy, metrics: Arc<Metrics>) -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
            pending: HashMap::new(),
            delivered: HashMap::new(),
            policy,
            metrics,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Enqueue a job for `subject_id` due at `due_at`.
    ///
    /// A booking reminder whose due time is not in the future is skipped.
    /// Payment reminders and follow-ups that are already due run on the
    /// next poll.
    pub fn schedule(
        &mut self,
        kind: JobKind,
        subject_id: impl Into<String>,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let subject_id = subject_id.into();
        let due_at = if due_at <= now {
            match kind {
                JobKind::BookingReminder => {
                    self.metrics.incr(Counter::JobSkipped);
                    tracing::debug!(
                        kind = %kind,
                        subject_id = %subject_id,
                        due_at = %due_at,
                        "reminder time already passed, not scheduling"
                    );
                    return ScheduleOutcome::Skipped {
                        reason: "reminder time already passed",
                    };
                }
                JobKind::PaymentReminder | JobKind::FollowUp => now,
            }
        } else {
            due_at
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let job = ScheduledJob::new(
            format!("job-{}", seq + 1),
            kind,
            subject_id,
            due_at,
            self.policy.max_attempts,
            now,
        );
        let id = job.id.clone();

        *self.pending.entry(job.key()).or_insert(0) += 1;
        self.metrics.incr(Counter::JobScheduled);
        tracing::info!(
            job_id = %id,
            kind = %job.kind,
            subject_id = %job.subject_id,
            due_at = %job.due_at,
            "job scheduled"
        );

        self.queue.push(QueuedJob { job, seq });
        ScheduleOutcome::Scheduled(id)
    }

    /// Remove and return every job due at or before `now`, earliest first.
    ///
    /// Returned jobs stay pending in the ledger until the caller reports
    /// them finished, delivered, or re-queues them with `retry`.
    pub fn poll_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let mut ready = Vec::new();
        while let Some(item) = self.queue.peek() {
            if item.job.due_at > now {
                break;
            }
            let Some(item) = self.queue.pop() else {
                break;
            };
            ready.push(item.job);
        }
        ready
    }

    /// Re-queue a failed job with backoff.
    ///
    /// Returns the retry time, or `None` when the attempt budget is spent and
    /// the job has been dropped.
    pub fn retry(&mut self, job: ScheduledJob, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if job.is_last_attempt() {
            self.mark_finished(&job.key());
            return None;
        }
        let retry_at = now + self.policy.backoff(job.attempts + 1);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueuedJob {
            job: job.retried_at(retry_at),
            seq,
        });
        Some(retry_at)
    }

    /// Record a successful delivery and release the job
    pub fn mark_delivered(&mut self, job: &ScheduledJob) {
        self.delivered.insert(job.key(), job.first_due_at);
        self.mark_finished(&job.key());
    }

    /// Release a job that will not run again
    pub fn mark_finished(&mut self, key: &JobKey) {
        if let Some(count) = self.pending.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending.remove(key);
            }
        }
    }

    /// Whether a job for `key` is queued or running
    pub fn has_pending(&self, key: &JobKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Original due time of the last delivered job for `key`
    pub fn last_delivered(&self, key: &JobKey) -> Option<DateTime<Utc>> {
        self.delivered.get(key).copied()
    }

    /// Number of queued jobs, not counting ones handed to a worker
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|item| item.job.due_at)
    }

    /// Queued jobs in due order
    pub fn queued(&self) -> Vec<ScheduledJob> {
        let mut items: Vec<&QueuedJob> = self.queue.iter().collect();
        items.sort_by_key(|item| (item.job.due_at, item.seq));
        items.into_iter().map(|item| item.job.clone()).collect()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
