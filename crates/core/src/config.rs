// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration loaded from TOML

use crate::job::RetryPolicy;
use crate::slot::StudioHours;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration; every section has defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub studio_hours: StudioHours,
    pub jobs: RetryPolicy,
    pub sweeps: SweepConfig,
    pub worker: WorkerConfig,
    pub storage: StorageConfig,
}

/// Reconciliation sweep cadence and windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    #[serde(with = "humantime_serde")]
    pub upcoming_interval: Duration,
    /// How far ahead the upcoming-bookings sweep looks
    #[serde(with = "humantime_serde")]
    pub upcoming_horizon: Duration,
    #[serde(with = "humantime_serde")]
    pub overdue_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub completed_interval: Duration,
    /// Completed bookings last updated in `[now - start, now - end)` get a follow-up
    #[serde(with = "humantime_serde")]
    pub completed_window_start: Duration,
    #[serde(with = "humantime_serde")]
    pub completed_window_end: Duration,
}

const HOUR: u64 = 60 * 60;

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            upcoming_interval: Duration::from_secs(HOUR),
            upcoming_horizon: Duration::from_secs(48 * HOUR),
            overdue_interval: Duration::from_secs(24 * HOUR),
            completed_interval: Duration::from_secs(24 * HOUR),
            completed_window_start: Duration::from_secs(48 * HOUR),
            completed_window_end: Duration::from_secs(24 * HOUR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// How often the daemon ticks sweeps and due jobs
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// A notification send still pending after this counts as failed
    #[serde(with = "humantime_serde")]
    pub dispatch_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            dispatch_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store queries slower than this are counted and logged
    #[serde(with = "humantime_serde")]
    pub slow_query_threshold: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: Duration::from_millis(100),
        }
    }
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_toml(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Convert a config duration into a chrono duration, saturating at ~136 years
pub fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(i64::from(
        u32::try_from(duration.as_secs()).unwrap_or(u32::MAX),
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
