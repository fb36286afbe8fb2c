// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking state machine
//!
//! A booking moves forward through INQUIRY → QUOTED → CONFIRMED →
//! IN_PROGRESS → COMPLETED, and may be CANCELLED from any state before
//! COMPLETED. Transitions are pure: they return the updated booking plus the
//! effects the caller should perform (status notification, job scheduling).

use crate::clock::Clock;
use crate::effect::{Effect, Event};
use crate::id::{BookingId, CustomerId, ServiceId, StudioId};
use crate::job::{follow_up_due_at, reminder_due_at, JobKind};
use crate::slot::TimeWindow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Log note written when a booking is first created
pub const INQUIRY_RECEIVED_NOTE: &str = "Booking inquiry received";

/// The status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Inquiry,
    Quoted,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Inquiry,
        BookingStatus::Quoted,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Active bookings still occupy their calendar slot
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Inquiry | BookingStatus::Quoted | BookingStatus::Confirmed
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The transition table
    pub fn can_transition_to(self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, target) {
            (Inquiry, Quoted) | (Quoted, Confirmed) | (Confirmed, InProgress) => true,
            (InProgress, Completed) => true,
            (Inquiry | Quoted | Confirmed | InProgress, Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Inquiry => "INQUIRY",
            BookingStatus::Quoted => "QUOTED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Human-readable label used in notifications
    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Inquiry => "Inquiry",
            BookingStatus::Quoted => "Quoted",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::InProgress => "In progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INQUIRY" => Ok(BookingStatus::Inquiry),
            "QUOTED" => Ok(BookingStatus::Quoted),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "IN_PROGRESS" => Ok(BookingStatus::InProgress),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("unknown booking status: {}", s)),
        }
    }
}

/// Errors from booking and invoice state machines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0}")]
    InvalidOperation(String),
}

/// One entry of a booking's append-only status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    pub status: BookingStatus,
    pub at: DateTime<Utc>,
    pub note: String,
}

/// Request to create a booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub studio_id: StudioId,
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
}

impl NewBooking {
    pub fn new(
        studio_id: impl Into<StudioId>,
        customer_id: impl Into<CustomerId>,
        service_id: impl Into<ServiceId>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            studio_id: studio_id.into(),
            customer_id: customer_id.into(),
            service_id: service_id.into(),
            scheduled_at,
            notes: None,
            internal_notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_internal_notes(mut self, notes: impl Into<String>) -> Self {
        self.internal_notes = Some(notes.into());
        self
    }
}

/// A booked appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub studio_id: StudioId,
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub scheduled_at: DateTime<Utc>,
    /// Copied from the service at booking time; later service edits do not apply
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub status_log: Vec<StatusLogEntry>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new booking in the INQUIRY state
    pub fn new(
        id: impl Into<BookingId>,
        request: NewBooking,
        duration_minutes: u32,
        clock: &impl Clock,
    ) -> (Booking, Vec<Effect>) {
        let now = clock.now();
        let booking = Booking {
            id: id.into(),
            studio_id: request.studio_id,
            customer_id: request.customer_id,
            service_id: request.service_id,
            scheduled_at: request.scheduled_at,
            duration_minutes,
            status: BookingStatus::Inquiry,
            status_log: vec![StatusLogEntry {
                status: BookingStatus::Inquiry,
                at: now,
                note: INQUIRY_RECEIVED_NOTE.to_string(),
            }],
            notes: request.notes,
            internal_notes: request.internal_notes,
            created_at: now,
            updated_at: now,
        };
        let effects = vec![Effect::Emit(Event::BookingCreated {
            id: booking.id.clone(),
            studio_id: booking.studio_id.clone(),
            scheduled_at: booking.scheduled_at,
        })];
        (booking, effects)
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.scheduled_at + self.duration()
    }

    /// The half-open interval the booking occupies
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.scheduled_at, self.duration())
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The most recent status log entry
    pub fn last_status_change(&self) -> Option<&StatusLogEntry> {
        self.status_log.last()
    }

    /// Pure transition function - returns the updated booking and effects.
    ///
    /// Rejected transitions leave the booking untouched.
    pub fn transition(
        &self,
        target: BookingStatus,
        note: Option<String>,
        clock: &impl Clock,
    ) -> Result<(Booking, Vec<Effect>), TransitionError> {
        if !self.status.can_transition_to(target) {
            return Err(TransitionError::InvalidTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }

        let now = clock.now();
        let note = note.unwrap_or_else(|| format!("Status changed to {}", target));
        let mut status_log = self.status_log.clone();
        status_log.push(StatusLogEntry {
            status: target,
            at: now,
            note,
        });

        let booking = Booking {
            status: target,
            status_log,
            updated_at: now,
            ..self.clone()
        };

        let mut effects = vec![Effect::Emit(Event::BookingStatusChanged {
            id: self.id.clone(),
            from: self.status,
            to: target,
        })];
        match target {
            BookingStatus::Confirmed => effects.push(Effect::ScheduleJob {
                kind: JobKind::BookingReminder,
                subject_id: self.id.to_string(),
                due_at: reminder_due_at(self.scheduled_at),
            }),
            BookingStatus::Completed => effects.push(Effect::ScheduleJob {
                kind: JobKind::FollowUp,
                subject_id: self.id.to_string(),
                due_at: follow_up_due_at(now),
            }),
            // Pending jobs for a cancelled booking no-op when they run
            BookingStatus::Inquiry
            | BookingStatus::Quoted
            | BookingStatus::InProgress
            | BookingStatus::Cancelled => {}
        }

        Ok((booking, effects))
    }

    /// Cancel the booking.
    ///
    /// Completed and already-cancelled bookings are rejected up front with
    /// `InvalidOperation` rather than a generic invalid transition.
    pub fn cancel(
        &self,
        reason: Option<String>,
        clock: &impl Clock,
    ) -> Result<(Booking, Vec<Effect>), TransitionError> {
        match self.status {
            BookingStatus::Completed => Err(TransitionError::InvalidOperation(
                "cannot cancel a completed booking".to_string(),
            )),
            BookingStatus::Cancelled => Err(TransitionError::InvalidOperation(
                "booking is already cancelled".to_string(),
            )),
            _ => {
                let note = reason.map(|r| format!("Booking cancelled: {}", r));
                self.transition(BookingStatus::Cancelled, note, clock)
            }
        }
    }

    /// Move an active booking to a new start time.
    ///
    /// Status and status log are unchanged. A confirmed booking gets a fresh
    /// reminder for the new time.
    pub fn reschedule(
        &self,
        new_start: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(Booking, Vec<Effect>), TransitionError> {
        if !self.is_active() {
            return Err(TransitionError::InvalidOperation(format!(
                "cannot reschedule a booking in status {}",
                self.status
            )));
        }

        let booking = Booking {
            scheduled_at: new_start,
            updated_at: clock.now(),
            ..self.clone()
        };

        let mut effects = vec![Effect::Emit(Event::BookingRescheduled {
            id: self.id.clone(),
            from: self.scheduled_at,
            to: new_start,
        })];
        if self.status == BookingStatus::Confirmed {
            effects.push(Effect::ScheduleJob {
                kind: JobKind::BookingReminder,
                subject_id: self.id.to_string(),
                due_at: reminder_due_at(new_start),
            });
        }

        Ok((booking, effects))
    }
}

#[cfg(test)]
#[path = "booking_tests.rs"]
mod tests;
