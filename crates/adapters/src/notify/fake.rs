// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notifier for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use shutter_core::{Booking, BookingId, BookingStatus, Invoice, InvoiceId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    BookingReminder { booking_id: BookingId },
    PaymentReminder { invoice_id: InvoiceId },
    FollowUp { booking_id: BookingId },
    StatusUpdate {
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<NotifyCall>,
    /// Number of upcoming sends that fail before succeeding again
    fail_next: u32,
    failing: bool,
    /// Subjects whose sends never complete
    stalled: HashSet<String>,
}

/// Fake notifier that records calls and can inject failures.
///
/// Failed sends are not recorded as calls.
#[derive(Clone, Default)]
pub struct FakeNotifier {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all successfully delivered notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Make the next `n` sends fail
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_next = n;
    }

    /// Make every send fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).failing = failing;
    }

    /// Make every send about `subject_id` hang forever
    pub fn stall(&self, subject_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stalled
            .insert(subject_id.to_string());
    }

    async fn deliver(&self, subject_id: &str, call: NotifyCall) -> Result<(), NotifyError> {
        let stalled = self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stalled
            .contains(subject_id);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.record(call)
    }

    fn record(&self, call: NotifyCall) -> Result<(), NotifyError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if state.failing {
            return Err(NotifyError::Failed("injected failure".to_string()));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(NotifyError::Failed("injected failure".to_string()));
        }
        state.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_booking_reminder(&self, booking: &Booking) -> Result<(), NotifyError> {
        let call = NotifyCall::BookingReminder {
            booking_id: booking.id.clone(),
        };
        self.deliver(booking.id.as_str(), call).await
    }

    async fn send_payment_reminder(&self, invoice: &Invoice) -> Result<(), NotifyError> {
        let call = NotifyCall::PaymentReminder {
            invoice_id: invoice.id.clone(),
        };
        self.deliver(invoice.id.as_str(), call).await
    }

    async fn send_follow_up(&self, booking: &Booking) -> Result<(), NotifyError> {
        let call = NotifyCall::FollowUp {
            booking_id: booking.id.clone(),
        };
        self.deliver(booking.id.as_str(), call).await
    }

    async fn send_booking_status_update(
        &self,
        booking: &Booking,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<(), NotifyError> {
        let call = NotifyCall::StatusUpdate {
            booking_id: booking.id.clone(),
            from,
            to,
        };
        self.deliver(booking.id.as_str(), call).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
