// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Studio and service records referenced by bookings

use crate::id::{ServiceId, StudioId};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// A studio (tenant) that owns a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Studio {
    pub id: StudioId,
    pub name: String,
    /// Offset of studio-local time from UTC, used to lay out daily slots
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Studio {
    pub fn new(id: impl Into<StudioId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            utc_offset_minutes: 0,
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Studio-local offset; out-of-range values fall back to UTC
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// A bookable service offered by a studio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub studio_id: StudioId,
    pub name: String,
    pub duration_minutes: u32,
}

impl Service {
    pub fn new(
        id: impl Into<ServiceId>,
        studio_id: impl Into<StudioId>,
        name: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            studio_id: studio_id.into(),
            name: name.into(),
            duration_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_minutes() {
        let studio = Studio::new("studio-1", "North Light").with_utc_offset_minutes(-300);
        assert_eq!(studio.offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let studio = Studio::new("studio-1", "North Light").with_utc_offset_minutes(48 * 60);
        assert_eq!(studio.offset().local_minus_utc(), 0);
    }
}
