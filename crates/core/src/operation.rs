// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::booking::{Booking, BookingStatus, StatusLogEntry};
use crate::id::{BookingId, InvoiceId};
use crate::invoice::{Invoice, InvoiceStatus, Payment};
use crate::studio::{Service, Studio};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create or replace a studio record
    StudioUpsert { studio: Studio },

    /// Create or replace a service record
    ServiceUpsert { service: Service },

    /// Create a booking, including its first status log entry
    BookingCreate { booking: Booking },

    /// Change a booking's status and append the matching log entry
    BookingTransition {
        id: BookingId,
        status: BookingStatus,
        entry: StatusLogEntry,
    },

    /// Move a booking to a new start time
    BookingReschedule {
        id: BookingId,
        scheduled_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },

    /// Create an invoice
    InvoiceCreate { invoice: Invoice },

    /// Change an invoice's status
    InvoiceStatusUpdate {
        id: InvoiceId,
        status: InvoiceStatus,
        updated_at: DateTime<Utc>,
    },

    /// Record a payment and the status it produced
    InvoicePayment {
        id: InvoiceId,
        payment: Payment,
        status: InvoiceStatus,
    },
}

impl Operation {
    /// Operation that persists a booking transition
    pub fn booking_transition(updated: &Booking) -> Option<Operation> {
        updated
            .last_status_change()
            .map(|entry| Operation::BookingTransition {
                id: updated.id.clone(),
                status: updated.status,
                entry: entry.clone(),
            })
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
