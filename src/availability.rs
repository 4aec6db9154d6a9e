// Room availability for one displayed month
// Merges the per-room calendar with the fully-booked dates of the room's type.

use crate::api::{ApiError, BookingApi};
use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

// Share of placeholder days marked available when the backend is unreachable
pub const PLACEHOLDER_AVAILABILITY: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    pub available: bool,
}

impl AvailabilityDay {
    pub fn new(date: NaiveDate, available: bool) -> Self {
        Self { date, available }
    }
}

// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Live,
    // Synthetic placeholder data; not fit for booking decisions
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySnapshot {
    pub room_id: String,
    pub month_start: NaiveDate,
    pub days: Vec<AvailabilityDay>,
    pub source: SnapshotSource,
}

impl AvailabilitySnapshot {
    pub fn is_degraded(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }

    pub fn day(&self, date: NaiveDate) -> Option<&AvailabilityDay> {
        self.days.iter().find(|day| day.date == date)
    }

    // Dates outside the snapshot count as unavailable
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.day(date).map_or(false, |day| day.available)
    }

    pub fn available_count(&self) -> usize {
        self.days.iter().filter(|day| day.available).count()
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() => 29,
        _ => 28,
    }
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date) + Duration::days(days_in_month(date) as i64 - 1)
}

/// First day of the month `month_offset` months after the month containing
/// `today`. `None` only when the offset runs past chrono's calendar range.
pub fn month_start(today: NaiveDate, month_offset: u32) -> Option<NaiveDate> {
    first_of_month(today).checked_add_months(Months::new(month_offset))
}

pub fn month_dates(month_start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = first_of_month(month_start);
    first.iter_days().take(days_in_month(first) as usize)
}

/// Builds the authoritative day list for one month.
///
/// A date is unavailable when the per-room calendar marks it so or when it is
/// fully booked for the room type; dates neither source mentions are open.
/// Entries outside the month are ignored, so the result always holds exactly
/// one entry per calendar day, ascending.
pub fn merge_month(
    month_start: NaiveDate,
    room_days: &[AvailabilityDay],
    fully_booked: &[NaiveDate],
) -> Vec<AvailabilityDay> {
    let mut blocked: HashSet<NaiveDate> = room_days
        .iter()
        .filter(|day| !day.available)
        .map(|day| day.date)
        .collect();
    blocked.extend(fully_booked.iter().copied());

    month_dates(month_start)
        .map(|date| AvailabilityDay::new(date, !blocked.contains(&date)))
        .collect()
}

fn placeholder_seed(room_id: &str, month_start: NaiveDate) -> u64 {
    room_id.bytes().fold(month_start.num_days_from_ce() as u64, |seed, byte| {
        seed.wrapping_mul(31).wrapping_add(byte as u64)
    })
}

// Deterministic stand-in for a month the backend could not provide
pub fn synthetic_month(room_id: &str, month_start: NaiveDate) -> Vec<AvailabilityDay> {
    let first = first_of_month(month_start);
    let mut rng = StdRng::seed_from_u64(placeholder_seed(room_id, first));
    month_dates(first)
        .map(|date| AvailabilityDay::new(date, rng.gen_bool(PLACEHOLDER_AVAILABILITY)))
        .collect()
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("room id is empty")]
    EmptyRoomId,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("backend refused: {0}")]
    Rejected(String),

    #[error("response missing {0}")]
    MissingData(&'static str),
}

pub struct AvailabilityFetcher {
    api: Arc<dyn BookingApi>,
}

impl AvailabilityFetcher {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    // Month `month_offset` months from the current local month
    pub async fn fetch(
        &self,
        room_id: &str,
        month_offset: u32,
        refresh_token: u64,
    ) -> AvailabilitySnapshot {
        self.fetch_relative(Local::now().date_naive(), room_id, month_offset, refresh_token)
            .await
    }

    pub async fn fetch_relative(
        &self,
        today: NaiveDate,
        room_id: &str,
        month_offset: u32,
        refresh_token: u64,
    ) -> AvailabilitySnapshot {
        let start = month_start(today, month_offset).unwrap_or_else(|| {
            warn!(month_offset, "month offset out of range, showing current month");
            first_of_month(today)
        });
        self.fetch_month(room_id, start, refresh_token).await
    }

    /// Never fails: any transport or body problem yields a `Fallback` snapshot.
    pub async fn fetch_month(
        &self,
        room_id: &str,
        month_start: NaiveDate,
        refresh_token: u64,
    ) -> AvailabilitySnapshot {
        let month_start = first_of_month(month_start);
        debug!(room_id, %month_start, refresh_token, "fetching availability");

        match self.resolve(room_id, month_start, refresh_token).await {
            Ok(days) => AvailabilitySnapshot {
                room_id: room_id.to_string(),
                month_start,
                days,
                source: SnapshotSource::Live,
            },
            Err(e) => {
                warn!(room_id, %month_start, error = %e, "availability unavailable, using placeholder data");
                AvailabilitySnapshot {
                    room_id: room_id.to_string(),
                    month_start,
                    days: synthetic_month(room_id, month_start),
                    source: SnapshotSource::Fallback,
                }
            }
        }
    }

    async fn resolve(
        &self,
        room_id: &str,
        month_start: NaiveDate,
        refresh_token: u64,
    ) -> Result<Vec<AvailabilityDay>, FetchError> {
        if room_id.trim().is_empty() {
            return Err(FetchError::EmptyRoomId);
        }

        let month_end = last_of_month(month_start);
        let (calendar, fully_booked) = futures::join!(
            self.api.availability_calendar(room_id, month_start, refresh_token),
            self.api.unavailable_dates(room_id, month_start, month_end)
        );

        let calendar = calendar?;
        if !calendar.success {
            return Err(FetchError::Rejected(
                calendar
                    .message
                    .unwrap_or_else(|| "Failed to fetch availability".to_string()),
            ));
        }

        let fully_booked = fully_booked?;
        if !fully_booked.success {
            return Err(FetchError::Rejected("unavailable dates request failed".to_string()));
        }
        let fully_booked = fully_booked
            .data
            .ok_or(FetchError::MissingData("unavailable dates"))?;

        let days = merge_month(
            month_start,
            &calendar.availability,
            &fully_booked.unavailable_dates,
        );
        let available = days.iter().filter(|day| day.available).count();
        debug!(
            room_id,
            available,
            booked = days.len() - available,
            fully_booked = fully_booked.unavailable_dates.len(),
            "availability merged"
        );
        Ok(days)
    }
}
