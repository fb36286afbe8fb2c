// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-slot conflict detection and available-slot enumeration

use crate::booking::Booking;
use crate::id::{BookingId, StudioId};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// How a candidate time is compared with existing bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    /// Conflict only on an identical start instant (staff booking path)
    ExactInstant,
    /// Conflict on any overlap of the half-open intervals (public booking path)
    IntervalOverlap,
}

/// A candidate booking time to check against a studio's calendar
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub studio_id: StudioId,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    /// Ignore this booking, used when rescheduling it
    pub exclude: Option<BookingId>,
    pub mode: ConflictMode,
}

impl SlotRequest {
    pub fn new(
        studio_id: impl Into<StudioId>,
        start: DateTime<Utc>,
        duration_minutes: u32,
        mode: ConflictMode,
    ) -> Self {
        Self {
            studio_id: studio_id.into(),
            start,
            duration: Duration::minutes(i64::from(duration_minutes)),
            exclude: None,
            mode,
        }
    }

    pub fn excluding(mut self, booking_id: impl Into<BookingId>) -> Self {
        self.exclude = Some(booking_id.into());
        self
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.duration)
    }

    /// Whether `booking` blocks this request
    pub fn conflicts_with(&self, booking: &Booking) -> bool {
        if booking.studio_id != self.studio_id || !booking.is_active() {
            return false;
        }
        if self.exclude.as_ref() == Some(&booking.id) {
            return false;
        }
        match self.mode {
            ConflictMode::ExactInstant => booking.scheduled_at == self.start,
            ConflictMode::IntervalOverlap => self.window().overlaps(&booking.window()),
        }
    }
}

/// First booking that conflicts with the request, if any
pub fn find_conflict<'a, I>(bookings: I, request: &SlotRequest) -> Option<&'a Booking>
where
    I: IntoIterator<Item = &'a Booking>,
{
    bookings.into_iter().find(|b| request.conflicts_with(b))
}

pub fn has_conflict<'a, I>(bookings: I, request: &SlotRequest) -> bool
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(bookings, request).is_some()
}

/// Daily opening window used to lay out bookable slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    #[serde(with = "humantime_serde")]
    pub slot_step: std::time::Duration,
}

impl Default for StudioHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_step: std::time::Duration::from_secs(30 * 60),
        }
    }
}

impl StudioHours {
    /// Start instants from `open` (inclusive) to `close` (exclusive) on a
    /// studio-local calendar date
    pub fn candidate_starts(&self, date: NaiveDate, offset: FixedOffset) -> Vec<DateTime<Utc>> {
        let step = Duration::seconds(i64::from(
            u32::try_from(self.slot_step.as_secs()).unwrap_or(u32::MAX),
        ));
        if step <= Duration::zero() {
            return Vec::new();
        }

        let close = date.and_time(self.close);
        let mut cursor = date.and_time(self.open);
        let mut starts = Vec::new();
        while cursor < close {
            if let Some(local) = offset.from_local_datetime(&cursor).single() {
                starts.push(local.with_timezone(&Utc));
            }
            cursor += step;
        }
        starts
    }
}

/// A bookable start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub available: bool,
}

/// Open slots for a service of `duration_minutes` on a studio-local date.
///
/// Past starts and starts that overlap an active booking are dropped rather
/// than marked unavailable.
pub fn available_slots<'a, I>(
    bookings: I,
    studio_id: &StudioId,
    duration_minutes: u32,
    date: NaiveDate,
    hours: &StudioHours,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Vec<Slot>
where
    I: IntoIterator<Item = &'a Booking>,
{
    let active: Vec<&Booking> = bookings
        .into_iter()
        .filter(|b| &b.studio_id == studio_id && b.is_active())
        .collect();

    hours
        .candidate_starts(date, offset)
        .into_iter()
        .filter(|start| *start >= now)
        .filter(|start| {
            let request = SlotRequest::new(
                studio_id.clone(),
                *start,
                duration_minutes,
                ConflictMode::IntervalOverlap,
            );
            !has_conflict(active.iter().copied(), &request)
        })
        .map(|start| Slot {
            start,
            available: true,
        })
        .collect()
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
