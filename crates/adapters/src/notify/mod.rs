// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Customer notification adapters

mod noop;

pub use noop::NoOpNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use async_trait::async_trait;
use shutter_core::{Booking, BookingStatus, Invoice};
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Failed(String),
    #[error("recipient unreachable: {0}")]
    Unreachable(String),
    #[error("no response within {0:?}")]
    TimedOut(std::time::Duration),
}

/// Outbound messages to studio customers.
///
/// Implementations must be safe to call repeatedly for the same subject:
/// the worker retries failed deliveries.
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    /// Reminder ahead of a confirmed session
    async fn send_booking_reminder(&self, booking: &Booking) -> Result<(), NotifyError>;

    /// Reminder for an invoice with an outstanding balance
    async fn send_payment_reminder(&self, invoice: &Invoice) -> Result<(), NotifyError>;

    /// Thank-you / review request after a completed session
    async fn send_follow_up(&self, booking: &Booking) -> Result<(), NotifyError>;

    /// Tell the customer their booking moved from `from` to `to`
    async fn send_booking_status_update(
        &self,
        booking: &Booking,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<(), NotifyError>;
}
