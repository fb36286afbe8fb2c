// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{Notifier, NotifyError};
use async_trait::async_trait;
use shutter_core::{Booking, BookingStatus, Invoice};
use tracing::Instrument;

/// Wrapper that adds tracing to any Notifier
#[derive(Clone)]
pub struct TracedNotifier<N> {
    inner: N,
}

impl<N> TracedNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

fn log_outcome(result: &Result<(), NotifyError>, start: std::time::Instant) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(()) => tracing::info!(elapsed_ms, "delivered"),
        Err(e) => tracing::warn!(elapsed_ms, error = %e, "delivery failed"),
    }
}

#[async_trait]
impl<N: Notifier> Notifier for TracedNotifier<N> {
    async fn send_booking_reminder(&self, booking: &Booking) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.booking_reminder",
            booking_id = %booking.id,
            scheduled_at = %booking.scheduled_at,
        );
        async move {
            tracing::debug!(customer_id = %booking.customer_id, "sending");
            let start = std::time::Instant::now();
            let result = self.inner.send_booking_reminder(booking).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn send_payment_reminder(&self, invoice: &Invoice) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.payment_reminder",
            invoice_id = %invoice.id,
            balance_due = invoice.balance_due(),
        );
        async move {
            tracing::debug!(customer_id = %invoice.customer_id, "sending");
            let start = std::time::Instant::now();
            let result = self.inner.send_payment_reminder(invoice).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn send_follow_up(&self, booking: &Booking) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.follow_up", booking_id = %booking.id);
        async move {
            tracing::debug!(customer_id = %booking.customer_id, "sending");
            let start = std::time::Instant::now();
            let result = self.inner.send_follow_up(booking).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn send_booking_status_update(
        &self,
        booking: &Booking,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "notify.status_update",
            booking_id = %booking.id,
            from = %from,
            to = %to,
        );
        async move {
            let start = std::time::Instant::now();
            let result = self.inner.send_booking_status_update(booking, from, to).await;
            log_outcome(&result, start);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
