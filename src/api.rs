// Booking API contract
// The engine only ever talks to the booking service through the `BookingApi` trait below.

use crate::availability::AvailabilityDay;
use crate::booking::BookingPayload;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

// Errors raised by any transport implementing `BookingApi`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const BASE_URL_ENV: &str = "BOOKING_API_URL";
pub const TIMEOUT_ENV: &str = "BOOKING_API_TIMEOUT_MS";

// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Reads `BOOKING_API_URL` and `BOOKING_API_TIMEOUT_MS`, keeping the
    /// defaults for whichever is unset.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ClientError::ConfigError(format!("{} is empty", BASE_URL_ENV)));
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.timeout_ms = timeout.trim().parse().map_err(|_| {
                ClientError::ConfigError(format!("{} is not a number: {}", TIMEOUT_ENV, timeout))
            })?;
        }

        Ok(config)
    }
}

pub const DEFAULT_PRICE_PER_NIGHT: f64 = 3500.0;
pub const DEFAULT_CAPACITY: u32 = 2;

// Room catalog entry; read-only reference data for the engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", try_from = "RoomWire")]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub price_per_night: f64,
    pub capacity: u32,
}

// Room as the backend sends it: either id spelling, either price spelling,
// prices as numbers, numeric strings or null
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "_id", default)]
    object_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    room_type: Option<String>,
    #[serde(default)]
    price_per_night: Option<serde_json::Value>,
    #[serde(default)]
    price: Option<serde_json::Value>,
    #[serde(default)]
    capacity: Option<u32>,
}

fn positive_amount(value: Option<&serde_json::Value>) -> Option<f64> {
    let amount = match value? {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

impl TryFrom<RoomWire> for Room {
    type Error = String;

    fn try_from(wire: RoomWire) -> Result<Self, Self::Error> {
        let id = [wire.object_id, wire.id]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty())
            .ok_or_else(|| "room has no id".to_string())?;

        // Missing, null, zero or unparsable rates fall back to the house rate
        let price_per_night = positive_amount(wire.price_per_night.as_ref())
            .or_else(|| positive_amount(wire.price.as_ref()))
            .unwrap_or(DEFAULT_PRICE_PER_NIGHT);

        Ok(Self {
            id,
            name: wire.name.unwrap_or_default(),
            room_type: wire.room_type.unwrap_or_default(),
            price_per_night,
            capacity: wire.capacity.unwrap_or(DEFAULT_CAPACITY),
        })
    }
}

// Drops catalog entries that cannot be read instead of failing the whole list
fn lenient_rooms<'de, D>(deserializer: D) -> Result<Vec<Room>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match Room::deserialize(entry) {
            Ok(room) => Some(room),
            Err(e) => {
                warn!(error = %e, "skipping unreadable room entry");
                None
            }
        })
        .collect())
}

// Response bodies, one per endpoint
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AvailabilityCalendarResponse {
    pub success: bool,
    #[serde(default)]
    pub availability: Vec<AvailabilityDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct UnavailableDatesResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<UnavailableDates>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableDates {
    #[serde(default)]
    pub unavailable_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RoomsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_rooms")]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DateAvailabilityResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<DateAvailability>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DateAvailability {
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct CreateBookingResponse {
    pub success: bool,
    #[serde(default)]
    pub booking: Option<BookingReceipt>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    #[serde(default)]
    pub booking_reference: Option<String>,
}

impl CreateBookingResponse {
    // Backend error text, preferring `error` over `message`
    pub fn failure_reason(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

// The booking service as seen by the engine
#[async_trait]
pub trait BookingApi: Send + Sync + 'static {
    // Per-room day availability for the month starting at `month_start`
    async fn availability_calendar(
        &self,
        room_id: &str,
        month_start: NaiveDate,
        refresh_token: u64,
    ) -> Result<AvailabilityCalendarResponse, ApiError>;

    // Dates in [range_start, range_end] where every room of this room's type is booked
    async fn unavailable_dates(
        &self,
        room_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<UnavailableDatesResponse, ApiError>;

    async fn rooms(&self) -> Result<RoomsResponse, ApiError>;

    // Authoritative check that [check_in, check_out) is free
    async fn check_date_availability(
        &self,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<DateAvailabilityResponse, ApiError>;

    async fn create_booking(
        &self,
        payload: &BookingPayload,
    ) -> Result<CreateBookingResponse, ApiError>;
}
