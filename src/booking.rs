// Booking submission
// Guest form validation, payload construction and the single outbound create call.

use crate::api::{ApiError, BookingApi, Room};
use crate::pricing::{quote_range, BookingQuote, GuestComposition, PricingError, MAX_ROOMS};
use crate::selection::DateRange;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MAX_GUESTS: u32 = 20;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_SPECIAL_REQUESTS: usize = 500;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+]?[0-9\s-]{10,15}$").expect("phone pattern is valid"));

fn is_phone_valid(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please select a room")]
    MissingRoom,

    #[error("Number of guests must be between 1 and 20, got {0}")]
    GuestCount(u32),

    #[error("Number of children cannot exceed total guests")]
    TooManyChildren,

    #[error("Number of rooms must be between 1 and 6, got {0}")]
    RoomCount(u32),

    #[error("Name must be at least 2 characters")]
    NameTooShort,

    #[error("Please enter a valid phone number")]
    InvalidPhone,

    #[error("Check-in date cannot be in the past")]
    CheckInInPast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingForm {
    pub room_id: String,
    pub guests: u32,
    pub children: u32,
    pub number_of_rooms: u32,
    pub name: String,
    pub phone: String,
    pub special_requests: String,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            guests: 1,
            children: 0,
            number_of_rooms: 1,
            name: String::new(),
            phone: String::new(),
            special_requests: String::new(),
        }
    }
}

impl BookingForm {
    /// Checks the guest-entered fields. The first violation wins.
    ///
    /// `check_in` is only checked against `today` when a range has been picked;
    /// a missing range is reported by the submitter.
    pub fn validate(
        &self,
        today: NaiveDate,
        check_in: Option<NaiveDate>,
    ) -> Result<GuestComposition, FormError> {
        if self.room_id.trim().is_empty() {
            return Err(FormError::MissingRoom);
        }
        if !(1..=MAX_GUESTS).contains(&self.guests) {
            return Err(FormError::GuestCount(self.guests));
        }
        let composition = GuestComposition::new(self.guests, self.children)
            .map_err(|_| FormError::TooManyChildren)?;
        if !(1..=MAX_ROOMS).contains(&self.number_of_rooms) {
            return Err(FormError::RoomCount(self.number_of_rooms));
        }
        if self.name.trim().chars().count() < MIN_NAME_LEN {
            return Err(FormError::NameTooShort);
        }
        if !is_phone_valid(&self.phone) {
            return Err(FormError::InvalidPhone);
        }
        if check_in.map_or(false, |date| date < today) {
            return Err(FormError::CheckInInPast);
        }
        Ok(composition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
}

// Request body for `POST bookings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub room: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub children: u32,
    pub adults: u32,
    pub number_of_rooms: u32,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub nights: u32,
    pub price_per_night: f64,
    pub total_price: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub special_requests: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
}

impl BookingPayload {
    pub fn from_parts(
        form: &BookingForm,
        composition: GuestComposition,
        room: &Room,
        range: &DateRange,
        quote: &BookingQuote,
    ) -> Self {
        let digits: String = form.phone.chars().filter(|c| c.is_ascii_digit()).collect();
        let special_requests: String = form
            .special_requests
            .chars()
            .take(MAX_SPECIAL_REQUESTS)
            .collect();

        Self {
            room: room.id.clone(),
            check_in: range.check_in(),
            check_out: range.check_out(),
            guests: composition.guests(),
            children: composition.children(),
            adults: composition.adults(),
            number_of_rooms: quote.rooms_requested,
            guest_name: form.name.trim().to_string(),
            guest_email: format!("{}@guest.com", digits),
            guest_phone: digits,
            nights: quote.nights,
            price_per_night: quote.price_per_night,
            total_price: quote.total_price,
            tax_amount: quote.tax_amount,
            discount_amount: 0.0,
            special_requests: special_requests.trim().to_string(),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
        }
    }
}

fn network_message(error: &ApiError) -> String {
    match error {
        ApiError::ApiResponseError { message, .. } if !message.trim().is_empty() => {
            message.clone()
        }
        _ => "Failed to submit booking. Please try again.".to_string(),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Unable to load rooms. Please refresh the page and try again.")]
    NoRoomsAvailable,

    #[error("Please select a room.")]
    RoomNotFound,

    #[error("Please select check-in and check-out dates.")]
    MissingDates,

    #[error("Selected dates are not available. Please choose different dates.")]
    DatesUnavailable,

    #[error("Unable to verify availability. Please try again.")]
    AvailabilityCheckFailed(ApiError),

    #[error("Booking must be for at least 1 night")]
    InvalidStay,

    #[error(transparent)]
    Pricing(PricingError),

    // Backend answered success=false
    #[error("{0}")]
    Rejected(String),

    #[error("{}", network_message(.0))]
    Network(ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_reference: String,
    pub message: String,
    pub payload: BookingPayload,
}

pub struct BookingSubmitter {
    api: Arc<dyn BookingApi>,
}

impl BookingSubmitter {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self { api }
    }

    // Room catalog; transport failures and success=false read as an empty list
    pub async fn fetch_rooms(&self) -> Vec<Room> {
        match self.api.rooms().await {
            Ok(response) if response.success => response.rooms,
            Ok(_) => {
                warn!("room list request reported failure");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch rooms");
                Vec::new()
            }
        }
    }

    /// Validates and submits one booking.
    ///
    /// An empty `rooms` cache is refilled with one fetch before giving up. The
    /// create call is issued at most once and never retried.
    pub async fn submit(
        &self,
        rooms: &mut Vec<Room>,
        form: &BookingForm,
        selection: Option<DateRange>,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, SubmissionError> {
        let composition = form.validate(today, selection.map(|range| range.check_in()))?;

        if rooms.is_empty() {
            debug!("room list empty, fetching once before submit");
            *rooms = self.fetch_rooms().await;
            if rooms.is_empty() {
                return Err(SubmissionError::NoRoomsAvailable);
            }
        }

        let room = rooms
            .iter()
            .find(|room| room.id == form.room_id)
            .ok_or(SubmissionError::RoomNotFound)?;

        let range = selection.ok_or(SubmissionError::MissingDates)?;

        self.confirm_available(&room.id, &range).await?;

        let quote = quote_range(&range, room.price_per_night, form.number_of_rooms).map_err(
            |e| match e {
                PricingError::NoNights => SubmissionError::InvalidStay,
                other => SubmissionError::Pricing(other),
            },
        )?;

        let payload = BookingPayload::from_parts(form, composition, room, &range, &quote);
        info!(
            room = %payload.room,
            check_in = %payload.check_in,
            check_out = %payload.check_out,
            total = payload.total_price,
            "submitting booking"
        );

        let response = self
            .api
            .create_booking(&payload)
            .await
            .map_err(SubmissionError::Network)?;

        if !response.success {
            let reason = response
                .failure_reason()
                .unwrap_or("Failed to submit booking")
                .to_string();
            warn!(reason = %reason, "booking rejected");
            return Err(SubmissionError::Rejected(reason));
        }

        let booking_reference = response
            .booking
            .and_then(|booking| booking.booking_reference)
            .unwrap_or_else(|| "Pending".to_string());
        info!(reference = %booking_reference, "booking confirmed");

        Ok(BookingConfirmation {
            message: format!(
                "Booking confirmed! Reference: {}. We'll contact you at {} soon!",
                booking_reference, form.phone
            ),
            booking_reference,
            payload,
        })
    }

    // Authoritative re-check; the local snapshot may be stale by now
    async fn confirm_available(
        &self,
        room_id: &str,
        range: &DateRange,
    ) -> Result<(), SubmissionError> {
        let response = self
            .api
            .check_date_availability(room_id, range.check_in(), range.check_out())
            .await
            .map_err(|e| {
                warn!(error = %e, "availability re-check failed");
                SubmissionError::AvailabilityCheckFailed(e)
            })?;

        if !response.success {
            return Err(SubmissionError::AvailabilityCheckFailed(
                ApiError::MalformedResponse("availability check reported failure".to_string()),
            ));
        }

        match response.data {
            Some(data) if data.available => Ok(()),
            Some(_) => {
                info!(room_id, check_in = %range.check_in(), "dates taken since selection");
                Err(SubmissionError::DatesUnavailable)
            }
            None => Err(SubmissionError::AvailabilityCheckFailed(
                ApiError::MalformedResponse("availability check missing data".to_string()),
            )),
        }
    }
}
