// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deferred notification jobs and their retry policy

use crate::id::JobId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far ahead of the appointment a booking reminder fires
pub const REMINDER_LEAD_HOURS: i64 = 24;

/// How long after completion the follow-up goes out
pub const FOLLOW_UP_DELAY_HOURS: i64 = 24;

/// The kind of notification a job delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    BookingReminder,
    PaymentReminder,
    FollowUp,
}

/// What a job's subject id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Booking,
    Invoice,
}

impl JobKind {
    pub fn subject(self) -> SubjectKind {
        match self {
            JobKind::BookingReminder | JobKind::FollowUp => SubjectKind::Booking,
            JobKind::PaymentReminder => SubjectKind::Invoice,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::BookingReminder => "BOOKING_REMINDER",
            JobKind::PaymentReminder => "PAYMENT_REMINDER",
            JobKind::FollowUp => "FOLLOW_UP",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Due time of the reminder for an appointment starting at `scheduled_at`
pub fn reminder_due_at(scheduled_at: DateTime<Utc>) -> DateTime<Utc> {
    scheduled_at - Duration::hours(REMINDER_LEAD_HOURS)
}

/// Due time of the follow-up for a booking completed at `completed_at`
pub fn follow_up_due_at(completed_at: DateTime<Utc>) -> DateTime<Utc> {
    completed_at + Duration::hours(FOLLOW_UP_DELAY_HOURS)
}

/// Identity of the thing a job is about, ignoring its timing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub kind: JobKind,
    pub subject_id: String,
}

impl JobKey {
    pub fn new(kind: JobKind, subject_id: impl Into<String>) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
        }
    }
}

/// A unit of deferred work with a due time and retry budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: JobId,
    pub kind: JobKind,
    pub subject_id: String,
    pub due_at: DateTime<Utc>,
    /// Due time at scheduling; unlike `due_at` it survives retries
    pub first_due_at: DateTime<Utc>,
    /// Executions already attempted
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(
        id: impl Into<JobId>,
        kind: JobKind,
        subject_id: impl Into<String>,
        due_at: DateTime<Utc>,
        max_attempts: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            subject_id: subject_id.into(),
            due_at,
            first_due_at: due_at,
            attempts: 0,
            max_attempts,
            created_at,
        }
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(self.kind, self.subject_id.clone())
    }

    /// The job after a failed attempt, due again at `retry_at`
    pub fn retried_at(&self, retry_at: DateTime<Utc>) -> Self {
        Self {
            attempts: self.attempts + 1,
            due_at: retry_at,
            ..self.clone()
        }
    }

    /// Whether a failure on the current attempt uses up the budget
    pub fn is_last_attempt(&self) -> bool {
        self.attempts + 1 >= self.max_attempts
    }
}

/// Retry budget and exponential backoff for failed jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub base_backoff: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub max_backoff: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: std::time::Duration::from_secs(60),
            max_backoff: std::time::Duration::from_secs(30 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base = self.base_backoff.as_secs();
        let scaled = base.saturating_mul(1u64 << exponent);
        let capped = scaled.min(self.max_backoff.as_secs());
        Duration::seconds(i64::from(u32::try_from(capped).unwrap_or(u32::MAX)))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
