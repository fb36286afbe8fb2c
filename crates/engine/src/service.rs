// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Booking and invoice operations exposed to the outer layer.
//!
//! Every mutation decides and persists under one store write, so a conflict
//! check and the booking it admits are atomic. Effects run afterwards and
//! never fail the mutation.

use crate::error::{BookingError, EntityKind};
use crate::executor::Executor;
use chrono::{DateTime, NaiveDate, Utc};
use shutter_adapters::Notifier;
use shutter_core::{
    available_slots, find_conflict, Booking, BookingId, BookingStatus, Clock, ConflictMode,
    Effect, IdGen, Invoice, InvoiceId, NewBooking, NewInvoice, Operation, Service, ServiceId,
    Slot, SlotRequest, Studio, StudioHours, StudioId, TransitionError,
};
use shutter_storage::{MaterializedState, Store};
use std::sync::Arc;

pub struct BookingService<N, C, I> {
    store: Arc<Store>,
    executor: Arc<Executor<N>>,
    clock: C,
    id_gen: I,
    hours: StudioHours,
}

fn require_studio<'a>(
    state: &'a MaterializedState,
    id: &StudioId,
) -> Result<&'a Studio, BookingError> {
    state
        .studios
        .get(id)
        .ok_or_else(|| BookingError::not_found(EntityKind::Studio, id))
}

fn require_service<'a>(
    state: &'a MaterializedState,
    id: &ServiceId,
) -> Result<&'a Service, BookingError> {
    state
        .services
        .get(id)
        .ok_or_else(|| BookingError::not_found(EntityKind::Service, id))
}

fn require_booking<'a>(
    state: &'a MaterializedState,
    id: &BookingId,
) -> Result<&'a Booking, BookingError> {
    state
        .booking(id)
        .ok_or_else(|| BookingError::not_found(EntityKind::Booking, id))
}

fn require_invoice<'a>(
    state: &'a MaterializedState,
    id: &InvoiceId,
) -> Result<&'a Invoice, BookingError> {
    state
        .invoice(id)
        .ok_or_else(|| BookingError::not_found(EntityKind::Invoice, id))
}

fn check_slot(state: &MaterializedState, request: &SlotRequest) -> Result<(), BookingError> {
    match find_conflict(state.bookings_for_studio(&request.studio_id), request) {
        Some(existing) => Err(BookingError::SlotConflict {
            studio_id: request.studio_id.clone(),
            start: request.start,
            conflicting: existing.id.clone(),
        }),
        None => Ok(()),
    }
}

fn invoice_status_op(invoice: &Invoice) -> Operation {
    Operation::InvoiceStatusUpdate {
        id: invoice.id.clone(),
        status: invoice.status,
        updated_at: invoice.updated_at,
    }
}

impl<N, C, I> BookingService<N, C, I>
where
    N: Notifier,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        store: Arc<Store>,
        executor: Arc<Executor<N>>,
        clock: C,
        id_gen: I,
        hours: StudioHours,
    ) -> Self {
        Self {
            store,
            executor,
            clock,
            id_gen,
            hours,
        }
    }

    /// Wait for status-update notifications still in flight
    pub async fn flush_notifications(&self) {
        self.executor.flush_notifications().await;
    }

    /// Create or replace a studio
    pub fn register_studio(&self, studio: Studio) -> Result<(), BookingError> {
        self.store
            .write(|_| Ok::<_, BookingError>((vec![Operation::StudioUpsert { studio }], ())))
    }

    /// Create or replace a service; its studio must exist
    pub fn register_service(&self, service: Service) -> Result<(), BookingError> {
        if service.duration_minutes == 0 {
            return Err(BookingError::InvalidOperation(format!(
                "service {} has zero duration",
                service.id
            )));
        }
        self.store.write(|state| {
            require_studio(state, &service.studio_id)?;
            Ok::<_, BookingError>((vec![Operation::ServiceUpsert { service }], ()))
        })
    }

    /// Create a booking in INQUIRY after checking the slot with `mode`.
    ///
    /// The duration is copied from the service now; later edits to the
    /// service do not affect the booking.
    pub async fn create_booking(
        &self,
        request: NewBooking,
        mode: ConflictMode,
    ) -> Result<Booking, BookingError> {
        let (booking, effects) = self.store.write(|state| {
            require_studio(state, &request.studio_id)?;
            let service = require_service(state, &request.service_id)?;
            if service.studio_id != request.studio_id {
                return Err(BookingError::InvalidOperation(format!(
                    "service {} is not offered by studio {}",
                    service.id, request.studio_id
                )));
            }
            let duration = service.duration_minutes;

            let slot = SlotRequest::new(
                request.studio_id.clone(),
                request.scheduled_at,
                duration,
                mode,
            );
            check_slot(state, &slot)?;

            let (booking, effects) =
                Booking::new(self.id_gen.next(), request, duration, &self.clock);
            let op = Operation::BookingCreate {
                booking: booking.clone(),
            };
            Ok::<_, BookingError>((vec![op], (booking, effects)))
        })?;

        tracing::info!(
            booking_id = %booking.id,
            studio_id = %booking.studio_id,
            scheduled_at = %booking.scheduled_at,
            "booking created"
        );
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(booking)
    }

    /// Move a booking to `target`, appending a status log entry
    pub async fn transition(
        &self,
        id: &BookingId,
        target: BookingStatus,
        note: Option<String>,
    ) -> Result<Booking, BookingError> {
        self.apply_transition(id, |booking, clock| booking.transition(target, note, clock))
            .await
    }

    /// Cancel a booking; completed or already-cancelled bookings are rejected
    pub async fn cancel(
        &self,
        id: &BookingId,
        reason: Option<String>,
    ) -> Result<Booking, BookingError> {
        self.apply_transition(id, |booking, clock| booking.cancel(reason, clock))
            .await
    }

    async fn apply_transition<F>(&self, id: &BookingId, step: F) -> Result<Booking, BookingError>
    where
        F: FnOnce(&Booking, &C) -> Result<(Booking, Vec<Effect>), TransitionError>,
    {
        let (from, updated, effects) = self.store.write(|state| {
            let current = require_booking(state, id)?;
            let (updated, effects) = step(current, &self.clock)?;
            let ops = Operation::booking_transition(&updated).into_iter().collect();
            Ok::<_, BookingError>((ops, (current.status, updated, effects)))
        })?;

        tracing::info!(
            booking_id = %updated.id,
            from = %from,
            to = %updated.status,
            "booking transitioned"
        );
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(updated)
    }

    /// Move an active booking to `new_start`, ignoring itself in the conflict check
    pub async fn reschedule(
        &self,
        id: &BookingId,
        new_start: DateTime<Utc>,
        mode: ConflictMode,
    ) -> Result<Booking, BookingError> {
        let (updated, effects) = self.store.write(|state| {
            let current = require_booking(state, id)?;
            let slot = SlotRequest::new(
                current.studio_id.clone(),
                new_start,
                current.duration_minutes,
                mode,
            )
            .excluding(current.id.clone());
            check_slot(state, &slot)?;

            let (updated, effects) = current.reschedule(new_start, &self.clock)?;
            let op = Operation::BookingReschedule {
                id: updated.id.clone(),
                scheduled_at: updated.scheduled_at,
                updated_at: updated.updated_at,
            };
            Ok::<_, BookingError>((vec![op], (updated, effects)))
        })?;

        tracing::info!(
            booking_id = %updated.id,
            scheduled_at = %updated.scheduled_at,
            "booking rescheduled"
        );
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(updated)
    }

    /// Open start times for `service_id` on a studio-local `date`
    pub fn list_available_slots(
        &self,
        studio_id: &StudioId,
        service_id: &ServiceId,
        date: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError> {
        let now = self.clock.now();
        self.store.read(|state| {
            let studio = require_studio(state, studio_id)?;
            let service = require_service(state, service_id)?;
            Ok::<_, BookingError>(available_slots(
                state.bookings_for_studio(studio_id),
                studio_id,
                service.duration_minutes,
                date,
                &self.hours,
                studio.offset(),
                now,
            ))
        })
    }

    pub fn get_booking(&self, id: &BookingId) -> Result<Booking, BookingError> {
        self.store.read(|state| require_booking(state, id).cloned())
    }

    /// All bookings of a studio ordered by start time
    pub fn bookings_for_studio(&self, studio_id: &StudioId) -> Result<Vec<Booking>, BookingError> {
        self.store.read(|state| {
            require_studio(state, studio_id)?;
            Ok::<_, BookingError>(
                state
                    .bookings_for_studio(studio_id)
                    .into_iter()
                    .cloned()
                    .collect(),
            )
        })
    }

    /// Create a DRAFT invoice
    pub fn create_invoice(&self, request: NewInvoice) -> Result<Invoice, BookingError> {
        let invoice = self.store.write(|state| {
            require_studio(state, &request.studio_id)?;
            if let Some(booking_id) = &request.booking_id {
                require_booking(state, booking_id)?;
            }
            if request.total <= 0 {
                return Err(BookingError::InvalidOperation(format!(
                    "invoice total must be positive, got {}",
                    request.total
                )));
            }
            let invoice = Invoice::new(self.id_gen.next(), request, &self.clock);
            let op = Operation::InvoiceCreate {
                invoice: invoice.clone(),
            };
            Ok::<_, BookingError>((vec![op], invoice))
        })?;
        tracing::info!(invoice_id = %invoice.id, total = invoice.total, "invoice created");
        Ok(invoice)
    }

    pub async fn send_invoice(&self, id: &InvoiceId) -> Result<Invoice, BookingError> {
        let (invoice, effects) = self.store.write(|state| {
            let (invoice, effects) = require_invoice(state, id)?.send(&self.clock)?;
            Ok::<_, BookingError>((vec![invoice_status_op(&invoice)], (invoice, effects)))
        })?;
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(invoice)
    }

    /// Record a payment in minor units
    pub async fn record_payment(
        &self,
        id: &InvoiceId,
        amount: i64,
    ) -> Result<Invoice, BookingError> {
        let (invoice, effects) = self.store.write(|state| {
            let (invoice, effects) =
                require_invoice(state, id)?.record_payment(amount, &self.clock)?;
            let ops = invoice
                .payments
                .last()
                .map(|payment| Operation::InvoicePayment {
                    id: invoice.id.clone(),
                    payment: payment.clone(),
                    status: invoice.status,
                })
                .into_iter()
                .collect();
            Ok::<_, BookingError>((ops, (invoice, effects)))
        })?;
        tracing::info!(
            invoice_id = %invoice.id,
            amount,
            status = %invoice.status,
            "payment recorded"
        );
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(invoice)
    }

    pub async fn cancel_invoice(&self, id: &InvoiceId) -> Result<Invoice, BookingError> {
        let (invoice, effects) = self.store.write(|state| {
            let (invoice, effects) = require_invoice(state, id)?.cancel(&self.clock)?;
            Ok::<_, BookingError>((vec![invoice_status_op(&invoice)], (invoice, effects)))
        })?;
        self.executor.execute_all(effects, self.clock.now()).await;
        Ok(invoice)
    }

    pub fn get_invoice(&self, id: &InvoiceId) -> Result<Invoice, BookingError> {
        self.store.read(|state| require_invoice(state, id).cloned())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
