// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invoice state machine (scheduling-relevant subset)

use crate::booking::TransitionError;
use crate::clock::Clock;
use crate::effect::{Effect, Event};
use crate::id::{BookingId, CustomerId, InvoiceId, StudioId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Sent to the customer and still awaiting money
    pub fn is_collectable(self) -> bool {
        matches!(
            self,
            InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
        )
    }

    /// No reminder should ever go out for a settled invoice
    pub fn is_settled(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment against an invoice, in minor currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
}

/// Request to create an invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub studio_id: StudioId,
    pub customer_id: CustomerId,
    pub booking_id: Option<BookingId>,
    pub due_date: Option<DateTime<Utc>>,
    pub total: i64,
}

impl NewInvoice {
    pub fn new(
        studio_id: impl Into<StudioId>,
        customer_id: impl Into<CustomerId>,
        total: i64,
    ) -> Self {
        Self {
            studio_id: studio_id.into(),
            customer_id: customer_id.into(),
            booking_id: None,
            due_date: None,
            total,
        }
    }

    pub fn for_booking(mut self, booking_id: impl Into<BookingId>) -> Self {
        self.booking_id = Some(booking_id.into());
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub studio_id: StudioId,
    pub customer_id: CustomerId,
    pub booking_id: Option<BookingId>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: InvoiceStatus,
    pub total: i64,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(id: impl Into<InvoiceId>, request: NewInvoice, clock: &impl Clock) -> Self {
        let now = clock.now();
        Self {
            id: id.into(),
            studio_id: request.studio_id,
            customer_id: request.customer_id,
            booking_id: request.booking_id,
            due_date: request.due_date,
            status: InvoiceStatus::Draft,
            total: request.total,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn amount_paid(&self) -> i64 {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn balance_due(&self) -> i64 {
        (self.total - self.amount_paid()).max(0)
    }

    /// Collectable and past its due date
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_collectable() && self.due_date.is_some_and(|due| due < now)
    }

    fn invalid(&self, to: InvoiceStatus) -> TransitionError {
        TransitionError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// DRAFT → SENT
    pub fn send(&self, clock: &impl Clock) -> Result<(Invoice, Vec<Effect>), TransitionError> {
        if self.status != InvoiceStatus::Draft {
            return Err(self.invalid(InvoiceStatus::Sent));
        }
        let invoice = Invoice {
            status: InvoiceStatus::Sent,
            updated_at: clock.now(),
            ..self.clone()
        };
        let effects = vec![Effect::Emit(Event::InvoiceSent {
            id: self.id.clone(),
        })];
        Ok((invoice, effects))
    }

    /// Record a payment; the invoice becomes PAID once the total is covered
    pub fn record_payment(
        &self,
        amount: i64,
        clock: &impl Clock,
    ) -> Result<(Invoice, Vec<Effect>), TransitionError> {
        if amount <= 0 {
            return Err(TransitionError::InvalidOperation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }
        if !self.status.is_collectable() {
            return Err(TransitionError::InvalidOperation(format!(
                "cannot record a payment on a {} invoice",
                self.status
            )));
        }

        let now = clock.now();
        let mut payments = self.payments.clone();
        payments.push(Payment {
            amount,
            paid_at: now,
        });
        let paid: i64 = payments.iter().map(|p| p.amount).sum();
        let status = if paid >= self.total {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        };

        let invoice = Invoice {
            status,
            payments,
            updated_at: now,
            ..self.clone()
        };
        let effects = vec![Effect::Emit(Event::InvoicePaymentRecorded {
            id: self.id.clone(),
            amount,
            status,
        })];
        Ok((invoice, effects))
    }

    /// SENT / PARTIALLY_PAID → OVERDUE
    pub fn mark_overdue(
        &self,
        clock: &impl Clock,
    ) -> Result<(Invoice, Vec<Effect>), TransitionError> {
        if !matches!(
            self.status,
            InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid
        ) {
            return Err(self.invalid(InvoiceStatus::Overdue));
        }
        let invoice = Invoice {
            status: InvoiceStatus::Overdue,
            updated_at: clock.now(),
            ..self.clone()
        };
        let effects = vec![Effect::Emit(Event::InvoiceOverdue {
            id: self.id.clone(),
        })];
        Ok((invoice, effects))
    }

    pub fn cancel(&self, clock: &impl Clock) -> Result<(Invoice, Vec<Effect>), TransitionError> {
        if self.status.is_settled() {
            return Err(TransitionError::InvalidOperation(format!(
                "cannot cancel a {} invoice",
                self.status
            )));
        }
        let invoice = Invoice {
            status: InvoiceStatus::Cancelled,
            updated_at: clock.now(),
            ..self.clone()
        };
        let effects = vec![Effect::Emit(Event::InvoiceCancelled {
            id: self.id.clone(),
        })];
        Ok((invoice, effects))
    }
}

#[cfg(test)]
#[path = "invoice_tests.rs"]
mod tests;
