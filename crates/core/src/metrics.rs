// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-lifetime counters, injected where they are recorded.
//!
//! Each [`Metrics`] owns its own prometheus registry, so two runtimes in one
//! process (or two tests) never see each other's counts.

use prometheus::{IntCounter, Opts, Registry};
use thiserror::Error;

/// Prefix on every exported counter name
const NAMESPACE: &str = "shutter";

#[derive(Debug, Error)]
#[error("metrics registry: {0}")]
pub struct MetricsError(#[from] prometheus::Error);

macro_rules! counters {
    ($($field:ident => $variant:ident: $help:literal),* $(,)?) => {
        /// Shared counters; hold behind an `Arc` and pass to each component
        pub struct Metrics {
            registry: Registry,
            $($field: IntCounter,)*
        }

        /// Point-in-time copy of [`Metrics`]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct MetricsSnapshot {
            $(pub $field: u64,)*
        }

        /// A counter that can be incremented
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Counter {
            $($variant,)*
        }

        impl Metrics {
            /// Fresh counters registered in a registry of their own
            pub fn new() -> Result<Self, MetricsError> {
                let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;
                $(
                    let $field = IntCounter::with_opts(Opts::new(
                        concat!(stringify!($field), "_total"),
                        $help,
                    ))?;
                    registry.register(Box::new($field.clone()))?;
                )*
                Ok(Self { registry, $($field,)* })
            }

            pub fn incr(&self, counter: Counter) {
                match counter {
                    $(Counter::$variant => self.$field.inc(),)*
                }
            }

            pub fn snapshot(&self) -> MetricsSnapshot {
                MetricsSnapshot {
                    $($field: self.$field.get(),)*
                }
            }

            /// Zero every counter
            pub fn reset(&self) {
                $(self.$field.reset();)*
            }
        }
    };
}

counters!(
    store_reads => StoreRead: "Store read queries",
    store_writes => StoreWrite: "Store write transactions",
    slow_queries => SlowQuery: "Store queries slower than the configured threshold",
    jobs_scheduled => JobScheduled: "Jobs added to the queue",
    jobs_skipped => JobSkipped: "Booking reminders dropped as already past due",
    jobs_dispatched => JobDispatched: "Jobs whose notification was delivered",
    jobs_noop => JobNoop: "Jobs dropped because their subject no longer applies",
    jobs_retried => JobRetried: "Failed deliveries requeued with backoff",
    jobs_abandoned => JobAbandoned: "Jobs dropped after spending their attempt budget",
    sweeps_run => SweepRun: "Reconciliation sweeps run",
);

impl Metrics {
    /// Registry holding this instance's counters, for export
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Metrics").field(&self.snapshot()).finish()
    }
}
