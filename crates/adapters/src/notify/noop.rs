// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notifier for deployments without an outbound channel.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use shutter_core::{Booking, BookingStatus, Invoice};

/// Notifier that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifier;

impl NoOpNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send_booking_reminder(&self, _booking: &Booking) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_payment_reminder(&self, _invoice: &Invoice) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_follow_up(&self, _booking: &Booking) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_booking_status_update(
        &self,
        _booking: &Booking,
        _from: BookingStatus,
        _to: BookingStatus,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
