// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use shutter_adapters::{NoOpNotifier, TracedNotifier};
use shutter_core::{ConfigError, Metrics, MetricsError, SystemClock, UuidIdGen};
use shutter_engine::{Runtime, RuntimeDeps};
use shutter_storage::{StorageError, Store};
use thiserror::Error;
use tracing::{info, warn};

/// Daemon runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<TracedNotifier<NoOpNotifier>, SystemClock, UuidIdGen>;

/// Daemon file layout
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding everything below
    pub state_dir: PathBuf,
    /// Scheduler settings (TOML); missing means defaults
    pub config_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the write-ahead log
    pub wal_path: PathBuf,
}

impl Config {
    /// Layout under the default state directory
    pub fn from_env() -> Result<Self, LifecycleError> {
        Ok(Self::in_dir(&state_dir()?))
    }

    /// Layout from `shutterd [STATE_DIR] [--config PATH]`; `args` excludes the program name
    pub fn from_args(args: &[String]) -> Result<Self, LifecycleError> {
        let mut state_dir = None;
        let mut config_path = None;
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().ok_or(LifecycleError::MissingValue("--config"))?;
                    config_path = Some(PathBuf::from(path));
                }
                dir => state_dir = Some(PathBuf::from(dir)),
            }
        }

        let mut config = match state_dir {
            Some(dir) => Self::in_dir(&dir),
            None => Self::from_env()?,
        };
        if let Some(path) = config_path {
            config.config_path = path;
        }
        Ok(config)
    }

    /// Layout under an explicit state directory
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            config_path: state_dir.join("shutter.toml"),
            lock_path: state_dir.join("shutterd.pid"),
            log_path: state_dir.join("shutterd.log"),
            wal_path: state_dir.join("wal").join("shutter.wal"),
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    /// Scheduler settings the runtime was built with
    pub settings: shutter_core::Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub runtime: Arc<DaemonRuntime>,
    pub start_time: Instant,
}

impl DaemonState {
    /// Time between ticks of sweeps and due jobs
    pub fn poll_interval(&self) -> std::time::Duration {
        self.settings.worker.poll_interval
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let pending = self
            .runtime
            .jobs()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        if pending > 0 {
            // Jobs live in memory; the sweeps re-derive them on the next start
            info!(pending, "dropping queued jobs");
        }

        // Each send is bounded by worker.dispatch_timeout
        self.runtime.flush_notifications().await;

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released automatically when self.lock_file is dropped
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            cleanup_on_failure(config, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire lock file FIRST - prevents two daemons sharing one WAL
    let lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    let settings = shutter_core::Config::load(&config.config_path)?;

    let metrics = Arc::new(Metrics::new()?);
    let store = Store::open(&config.wal_path)?
        .with_metrics(Arc::clone(&metrics), settings.storage.slow_query_threshold);

    let runtime = Runtime::new(
        RuntimeDeps {
            notifier: TracedNotifier::new(NoOpNotifier::new()),
            store: Arc::new(store),
            metrics,
        },
        &settings,
        SystemClock,
        UuidIdGen,
    );

    info!(
        state_dir = %config.state_dir.display(),
        poll_interval_ms = settings.worker.poll_interval.as_millis() as u64,
        dispatch_timeout_ms = settings.worker.dispatch_timeout.as_millis() as u64,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        settings,
        lock_file,
        runtime: Arc::new(runtime),
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config, error: &LifecycleError) {
    // Another daemon owns the PID file
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Get the state directory for shutter
fn state_dir() -> Result<PathBuf, LifecycleError> {
    // Use XDG_STATE_HOME or default to ~/.local/state
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("shutter"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/shutter"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
