// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use chrono::{DateTime, Utc};
use shutter_core::{
    Booking, BookingId, BookingStatus, Invoice, InvoiceId, Operation, Service, ServiceId, Studio,
    StudioId,
};
use std::collections::HashMap;

/// Materialized state built from WAL operations
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub studios: HashMap<StudioId, Studio>,
    pub services: HashMap<ServiceId, Service>,
    pub bookings: HashMap<BookingId, Booking>,
    pub invoices: HashMap<InvoiceId, Invoice>,
}

impl MaterializedState {
    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::StudioUpsert { studio } => {
                self.studios.insert(studio.id.clone(), studio.clone());
            }

            Operation::ServiceUpsert { service } => {
                self.services.insert(service.id.clone(), service.clone());
            }

            Operation::BookingCreate { booking } => {
                self.bookings.insert(booking.id.clone(), booking.clone());
            }

            Operation::BookingTransition { id, status, entry } => {
                if let Some(booking) = self.bookings.get_mut(id) {
                    booking.status = *status;
                    booking.updated_at = entry.at;
                    booking.status_log.push(entry.clone());
                }
            }

            Operation::BookingReschedule {
                id,
                scheduled_at,
                updated_at,
            } => {
                if let Some(booking) = self.bookings.get_mut(id) {
                    booking.scheduled_at = *scheduled_at;
                    booking.updated_at = *updated_at;
                }
            }

            Operation::InvoiceCreate { invoice } => {
                self.invoices.insert(invoice.id.clone(), invoice.clone());
            }

            Operation::InvoiceStatusUpdate {
                id,
                status,
                updated_at,
            } => {
                if let Some(invoice) = self.invoices.get_mut(id) {
                    invoice.status = *status;
                    invoice.updated_at = *updated_at;
                }
            }

            Operation::InvoicePayment {
                id,
                payment,
                status,
            } => {
                if let Some(invoice) = self.invoices.get_mut(id) {
                    invoice.status = *status;
                    invoice.updated_at = payment.paid_at;
                    invoice.payments.push(payment.clone());
                }
            }
        }
    }

    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    pub fn invoice(&self, id: &InvoiceId) -> Option<&Invoice> {
        self.invoices.get(id)
    }

    /// Bookings of a studio ordered by start time
    pub fn bookings_for_studio(&self, studio_id: &StudioId) -> Vec<&Booking> {
        let mut bookings: Vec<_> = self
            .bookings
            .values()
            .filter(|b| &b.studio_id == studio_id)
            .collect();
        bookings.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        bookings
    }

    /// Bookings in `status` starting within `[from, to]`
    pub fn bookings_starting_between(
        &self,
        status: BookingStatus,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<&Booking> {
        let mut bookings: Vec<_> = self
            .bookings
            .values()
            .filter(|b| b.status == status && b.scheduled_at >= from && b.scheduled_at <= to)
            .collect();
        bookings.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        bookings
    }

    /// Bookings in `status` whose last update falls in `[from, to)`
    pub fn bookings_updated_between(
        &self,
        status: BookingStatus,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<&Booking> {
        let mut bookings: Vec<_> = self
            .bookings
            .values()
            .filter(|b| b.status == status && b.updated_at >= from && b.updated_at < to)
            .collect();
        bookings.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        bookings
    }

    /// Collectable invoices whose due date is before `now`
    pub fn invoices_past_due(&self, now: DateTime<Utc>) -> Vec<&Invoice> {
        let mut invoices: Vec<_> = self
            .invoices
            .values()
            .filter(|i| i.is_past_due(now))
            .collect();
        invoices.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        invoices
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
