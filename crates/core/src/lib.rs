// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shutter-core: domain core of the studio booking scheduler
//!
//! This crate provides:
//! - Pure state machines for bookings and invoices
//! - Slot conflict detection and available-slot enumeration
//! - Job, retry and effect types consumed by the engine
//! - WAL operations, metrics and configuration

pub mod clock;
pub mod config;
pub mod id;
pub mod metrics;

// Domain (order matters for dependencies)
pub mod studio;
pub mod slot;
pub mod job;
pub mod effect;
pub mod booking;
pub mod invoice;
pub mod operation;

// Re-exports
pub use booking::{
    Booking, BookingStatus, NewBooking, StatusLogEntry, TransitionError, INQUIRY_RECEIVED_NOTE,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, StorageConfig, SweepConfig, WorkerConfig};
pub use effect::{Effect, Event};
pub use id::{
    BookingId, CustomerId, IdGen, InvoiceId, JobId, SequentialIdGen, ServiceId, StudioId,
    UuidIdGen,
};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice, Payment};
pub use job::{JobKey, JobKind, RetryPolicy, ScheduledJob, SubjectKind};
pub use metrics::{Counter, Metrics, MetricsError, MetricsSnapshot};
pub use operation::Operation;
pub use slot::{
    available_slots, find_conflict, has_conflict, ConflictMode, Slot, SlotRequest, StudioHours,
    TimeWindow,
};
pub use studio::{Service, Studio};
