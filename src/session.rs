// One guest's booking session
// Owns the displayed room and month, the availability snapshot and the selection.
// Loads are tagged with a request token so a slow, superseded response is dropped.

use crate::api::Room;
use crate::availability::{AvailabilityFetcher, AvailabilitySnapshot};
use crate::booking::{BookingConfirmation, BookingForm, BookingSubmitter, SubmissionError};
use crate::calendar_grid::{build_weeks, day_view, is_past, month_label, CalendarWeek, DayView};
use crate::pricing::{quote_range, BookingQuote, PricingError};
use crate::selection::{
    ClickOutcome, DateRange, SelectionPhase, SelectionState, SelectionStateMachine,
};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

// Everything a caller needs to run one availability fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRequest {
    pub token: u64,
    pub room_id: String,
    pub today: NaiveDate,
    pub month_offset: u32,
    pub refresh_token: u64,
}

#[derive(Debug, Clone)]
pub struct BookingSession {
    today: NaiveDate,
    room_id: Option<String>,
    month_offset: u32,
    refresh_token: u64,
    latest_request: u64,
    snapshot: Option<AvailabilitySnapshot>,
    selection: SelectionStateMachine,
    rooms: Vec<Room>,
}

impl BookingSession {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            room_id: None,
            month_offset: 0,
            refresh_token: 0,
            latest_request: 0,
            snapshot: None,
            selection: SelectionStateMachine::new(),
            rooms: Vec::new(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn month_offset(&self) -> u32 {
        self.month_offset
    }

    pub fn refresh_token(&self) -> u64 {
        self.refresh_token
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn set_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
    }

    pub async fn load_rooms(&mut self, submitter: &BookingSubmitter) -> &[Room] {
        self.rooms = submitter.fetch_rooms().await;
        &self.rooms
    }

    pub fn select_room(&mut self, room_id: &str) {
        if self.room_id.as_deref() == Some(room_id) {
            return;
        }
        debug!(room_id, "room changed");
        self.room_id = Some(room_id.to_string());
        self.invalidate();
    }

    pub fn set_month(&mut self, month_offset: u32) {
        if self.month_offset == month_offset {
            return;
        }
        self.month_offset = month_offset;
        self.invalidate();
    }

    pub fn next_month(&mut self) {
        self.set_month(self.month_offset.saturating_add(1));
    }

    // No-op on the current month
    pub fn previous_month(&mut self) {
        self.set_month(self.month_offset.saturating_sub(1));
    }

    pub fn month_label(&self) -> String {
        month_label(self.today, self.month_offset)
    }

    // Drops the shown month and selection; any load already in flight goes stale
    fn invalidate(&mut self) {
        self.latest_request += 1;
        self.snapshot = None;
        self.selection.reset();
    }

    /// Starts a load for the current room and month. Returns `None` until a
    /// room is selected. Only the most recently issued request may be applied.
    pub fn begin_load(&mut self) -> Option<AvailabilityRequest> {
        let room_id = self.room_id.clone()?;
        self.latest_request += 1;
        Some(AvailabilityRequest {
            token: self.latest_request,
            room_id,
            today: self.today,
            month_offset: self.month_offset,
            refresh_token: self.refresh_token,
        })
    }

    /// Installs a fetched snapshot if `token` is still the newest request.
    /// A new snapshot always clears the selection.
    pub fn apply_load(&mut self, token: u64, snapshot: AvailabilitySnapshot) -> bool {
        if token != self.latest_request {
            debug!(token, latest = self.latest_request, "discarding stale availability");
            return false;
        }
        if snapshot.is_degraded() {
            warn!(room_id = %snapshot.room_id, "showing placeholder availability");
        }
        self.snapshot = Some(snapshot);
        self.selection.reset();
        true
    }

    pub async fn reload(&mut self, fetcher: &AvailabilityFetcher) -> bool {
        let Some(request) = self.begin_load() else {
            return false;
        };
        let snapshot = fetcher
            .fetch_relative(
                request.today,
                &request.room_id,
                request.month_offset,
                request.refresh_token,
            )
            .await;
        self.apply_load(request.token, snapshot)
    }

    pub fn snapshot(&self) -> Option<&AvailabilitySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.snapshot.as_ref().map_or(false, |s| s.is_degraded())
    }

    pub fn click(&mut self, date: NaiveDate) -> ClickOutcome {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return ClickOutcome::Ignored;
        };
        let available = snapshot.is_available(date);
        self.selection
            .click(date, available, is_past(date, self.today), &snapshot.days)
    }

    pub fn clear_selection(&mut self) {
        self.selection.reset();
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    pub fn finalized(&self) -> Option<DateRange> {
        self.selection.finalized()
    }

    pub fn weeks(&self) -> Vec<CalendarWeek> {
        self.snapshot
            .as_ref()
            .map(|snapshot| build_weeks(&snapshot.days))
            .unwrap_or_default()
    }

    pub fn day_views(&self) -> Vec<DayView> {
        let state = self.selection.state();
        self.snapshot
            .as_ref()
            .map(|snapshot| {
                snapshot
                    .days
                    .iter()
                    .map(|day| day_view(day, &state, self.today))
                    .collect()
            })
            .unwrap_or_default()
    }

    // The booking form's room is the one whose calendar is shown
    fn form_for_room(&self, form: &BookingForm) -> BookingForm {
        BookingForm {
            room_id: self.room_id.clone().unwrap_or_default(),
            ..form.clone()
        }
    }

    /// Price for the current selection. The form is validated first, so an
    /// impossible guest mix never reaches pricing.
    pub fn quote(&self, form: &BookingForm) -> Result<BookingQuote, SubmissionError> {
        let form = self.form_for_room(form);
        let range = self.finalized();
        form.validate(self.today, range.map(|r| r.check_in()))?;

        let room = self
            .rooms
            .iter()
            .find(|room| room.id == form.room_id)
            .ok_or(SubmissionError::RoomNotFound)?;
        let range = range.ok_or(SubmissionError::MissingDates)?;

        quote_range(&range, room.price_per_night, form.number_of_rooms).map_err(|e| match e {
            PricingError::NoNights => SubmissionError::InvalidStay,
            other => SubmissionError::Pricing(other),
        })
    }

    /// Submits the current selection. On success the refresh token moves on,
    /// the selection clears and the caller should `reload` to show the new
    /// booking.
    pub async fn submit(
        &mut self,
        submitter: &BookingSubmitter,
        form: &BookingForm,
    ) -> Result<BookingConfirmation, SubmissionError> {
        if self.is_degraded() {
            warn!("submitting against placeholder availability; relying on server check");
        }

        let form = self.form_for_room(form);
        let range = self.finalized();
        let today = self.today;
        let confirmation = submitter
            .submit(&mut self.rooms, &form, range, today)
            .await?;

        self.refresh_token += 1;
        self.latest_request += 1;
        self.selection.reset();
        info!(
            reference = %confirmation.booking_reference,
            refresh_token = self.refresh_token,
            "booking placed, calendar needs refresh"
        );
        Ok(confirmation)
    }
}
