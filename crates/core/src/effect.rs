// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events for state machine orchestration

use crate::booking::BookingStatus;
use crate::id::{BookingId, InvoiceId, StudioId};
use crate::invoice::InvoiceStatus;
use crate::job::JobKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effects are side effects that state machines request.
///
/// State machines never perform them; the engine's executor does, and a
/// failing effect never undoes the transition that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Emit an event for other components to observe
    Emit(Event),
    /// Enqueue a delayed notification job
    ScheduleJob {
        kind: JobKind,
        subject_id: String,
        due_at: DateTime<Utc>,
    },
}

impl Effect {
    /// Short name used as the tracing span label
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit(_) => "emit",
            Effect::ScheduleJob { .. } => "schedule_job",
        }
    }
}

/// Events emitted by state machines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BookingCreated {
        id: BookingId,
        studio_id: StudioId,
        scheduled_at: DateTime<Utc>,
    },
    BookingStatusChanged {
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },
    BookingRescheduled {
        id: BookingId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    InvoiceSent {
        id: InvoiceId,
    },
    InvoicePaymentRecorded {
        id: InvoiceId,
        amount: i64,
        status: InvoiceStatus,
    },
    InvoiceOverdue {
        id: InvoiceId,
    },
    InvoiceCancelled {
        id: InvoiceId,
    },
}

impl Event {
    /// Colon-separated event name, e.g. `booking:status_changed`
    pub fn name(&self) -> &'static str {
        match self {
            Event::BookingCreated { .. } => "booking:created",
            Event::BookingStatusChanged { .. } => "booking:status_changed",
            Event::BookingRescheduled { .. } => "booking:rescheduled",
            Event::InvoiceSent { .. } => "invoice:sent",
            Event::InvoicePaymentRecorded { .. } => "invoice:payment_recorded",
            Event::InvoiceOverdue { .. } => "invoice:overdue",
            Event::InvoiceCancelled { .. } => "invoice:cancelled",
        }
    }
}
