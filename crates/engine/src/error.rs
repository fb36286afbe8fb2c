// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for booking operations

use chrono::{DateTime, Utc};
use shutter_core::{BookingId, StudioId, TransitionError};
use shutter_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Studio,
    Service,
    Booking,
    Invoice,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Studio => "studio",
            EntityKind::Service => "service",
            EntityKind::Booking => "booking",
            EntityKind::Invoice => "invoice",
        })
    }
}

/// Errors surfaced to callers of the booking service
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("slot conflict in studio {studio_id} at {start}: overlaps booking {conflicting}")]
    SlotConflict {
        studio_id: StudioId,
        start: DateTime<Utc>,
        conflicting: BookingId,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BookingError {
    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        BookingError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<TransitionError> for BookingError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { from, to } => {
                BookingError::InvalidTransition { from, to }
            }
            TransitionError::InvalidOperation(message) => BookingError::InvalidOperation(message),
        }
    }
}
