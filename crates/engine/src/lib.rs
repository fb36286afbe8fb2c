// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Booking lifecycle and scheduling engine

mod error;
mod executor;
mod runtime;
mod scheduler;
mod service;
mod sweeper;
mod worker;

pub use error::{BookingError, EntityKind};
pub use executor::{ExecuteError, Executor};
pub use runtime::{Runtime, RuntimeDeps, TickReport};
pub use scheduler::{JobScheduler, ScheduleOutcome};
pub use service::BookingService;
pub use sweeper::{SweepKind, SweepReport, SweepTimers, Sweeper};
pub use worker::{JobOutcome, JobReport, JobWorker};
