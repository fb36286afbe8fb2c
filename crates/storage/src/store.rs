// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic read-modify-write access to the materialized state

use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use shutter_core::{Counter, Metrics, Operation};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
}

struct Inner {
    wal: Option<Wal>,
    state: MaterializedState,
}

/// Serialized access to bookings and invoices.
///
/// Every `write` runs its closure under one lock, so a check made inside the
/// closure (e.g. a slot conflict check) and the operations it returns are a
/// single atomic unit. Operations are appended to the WAL before they are
/// applied; a failed append leaves the state untouched.
pub struct Store {
    inner: Mutex<Inner>,
    metrics: Option<Arc<Metrics>>,
    slow_query_threshold: Duration,
}

impl Store {
    /// A store without durability, for tests and ephemeral use
    pub fn in_memory() -> Self {
        Self::from_parts(None, MaterializedState::default())
    }

    /// Open a WAL-backed store, replaying existing operations
    pub fn open(wal_path: &Path) -> Result<Self, StorageError> {
        let mut state = MaterializedState::default();
        let ops = Wal::replay(wal_path)?;
        for op in &ops {
            state.apply(op);
        }
        tracing::info!(
            path = %wal_path.display(),
            operations = ops.len(),
            bookings = state.bookings.len(),
            invoices = state.invoices.len(),
            "replayed wal"
        );
        let wal = Wal::open(wal_path)?;
        Ok(Self::from_parts(Some(wal), state))
    }

    fn from_parts(wal: Option<Wal>, state: MaterializedState) -> Self {
        Self {
            inner: Mutex::new(Inner { wal, state }),
            metrics: None,
            slow_query_threshold: Duration::from_millis(100),
        }
    }

    /// Record query counts and slow queries into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>, slow_query_threshold: Duration) -> Self {
        self.metrics = Some(metrics);
        self.slow_query_threshold = slow_query_threshold;
        self
    }

    /// Run a read-only query against the current state
    pub fn read<T>(&self, query: impl FnOnce(&MaterializedState) -> T) -> T {
        let start = Instant::now();
        let result = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            query(&inner.state)
        };
        self.record(Counter::StoreRead, "read", start.elapsed());
        result
    }

    /// Atomically decide and persist a change.
    ///
    /// The closure sees the current state and returns the operations to
    /// persist plus a value for the caller. An `Err` from the closure leaves
    /// the store untouched.
    pub fn write<T, E>(
        &self,
        decide: impl FnOnce(&MaterializedState) -> Result<(Vec<Operation>, T), E>,
    ) -> Result<T, E>
    where
        E: From<StorageError>,
    {
        let start = Instant::now();
        let result = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let (ops, value) = decide(&inner.state)?;
            if !ops.is_empty() {
                if let Some(wal) = inner.wal.as_mut() {
                    wal.append(&ops).map_err(StorageError::from)?;
                }
                for op in &ops {
                    inner.state.apply(op);
                }
            }
            value
        };
        self.record(Counter::StoreWrite, "write", start.elapsed());
        Ok(result)
    }

    /// Persist operations unconditionally
    pub fn apply(&self, ops: Vec<Operation>) -> Result<(), StorageError> {
        self.write(|_| Ok::<_, StorageError>((ops, ())))
    }

    /// Copy of the whole state, mainly for inspection in tests
    pub fn snapshot(&self) -> MaterializedState {
        self.read(|state| state.clone())
    }

    fn record(&self, counter: Counter, kind: &'static str, elapsed: Duration) {
        let metrics = self.metrics.as_deref();
        if let Some(metrics) = metrics {
            metrics.incr(counter);
        }
        if elapsed > self.slow_query_threshold {
            if let Some(metrics) = metrics {
                metrics.incr(Counter::SlowQuery);
            }
            tracing::warn!(
                kind,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_query_threshold.as_millis() as u64,
                "slow store query"
            );
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
