// HTTP transport for the booking service
// JSON over reqwest; every endpoint hangs off the configured base URL.

use crate::api::{
    ApiError, AvailabilityCalendarResponse, BookingApi, ClientConfig, ClientError,
    CreateBookingResponse, DateAvailabilityResponse, RoomsResponse, UnavailableDatesResponse,
};
use crate::booking::BookingPayload;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct HttpBookingApi {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl HttpBookingApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ClientError::ConfigError(format!("invalid base url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::ConfigError(format!(
                "base url cannot hold paths: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    // Base URL plus percent-encoded path segments; a trailing '/' on the base is ignored
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn calendar_request(
        &self,
        room_id: &str,
        month_start: NaiveDate,
        refresh_token: u64,
    ) -> RequestBuilder {
        self.client
            .get(self.endpoint(&["rooms", room_id, "availability-calendar"]))
            .query(&[
                ("startDate", month_start.format(DATE_FORMAT).to_string()),
                ("_t", refresh_token.to_string()),
            ])
    }

    fn unavailable_dates_request(
        &self,
        room_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> RequestBuilder {
        self.client
            .get(self.endpoint(&["rooms", room_id, "unavailable-dates"]))
            .query(&[
                ("startDate", range_start.format(DATE_FORMAT).to_string()),
                ("endDate", range_end.format(DATE_FORMAT).to_string()),
            ])
    }

    fn rooms_request(&self) -> RequestBuilder {
        self.client.get(self.endpoint(&["rooms"]))
    }

    fn check_request(
        &self,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> RequestBuilder {
        self.client
            .get(self.endpoint(&["rooms", room_id, "check-availability"]))
            .query(&[
                ("checkIn", check_in.format(DATE_FORMAT).to_string()),
                ("checkOut", check_out.format(DATE_FORMAT).to_string()),
            ])
    }

    fn create_request(&self, payload: &BookingPayload) -> RequestBuilder {
        self.client.post(self.endpoint(&["bookings"])).json(payload)
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.timeout_ms)
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        debug!(%url, status = status.as_u16(), bytes = body.len(), "booking api response");
        decode_body(status, &body).map_err(|e| {
            warn!(%url, error = %e, "booking api call failed");
            e
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// Backend error text from a non-2xx body, preferring `error` over `message`
fn error_text(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    [parsed.error, parsed.message]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &Bytes) -> Result<T, ApiError> {
    if !status.is_success() {
        let message = error_text(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        });
        return Err(ApiError::ApiResponseError {
            status_code: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn availability_calendar(
        &self,
        room_id: &str,
        month_start: NaiveDate,
        refresh_token: u64,
    ) -> Result<AvailabilityCalendarResponse, ApiError> {
        self.execute(self.calendar_request(room_id, month_start, refresh_token))
            .await
    }

    async fn unavailable_dates(
        &self,
        room_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<UnavailableDatesResponse, ApiError> {
        self.execute(self.unavailable_dates_request(room_id, range_start, range_end))
            .await
    }

    async fn rooms(&self) -> Result<RoomsResponse, ApiError> {
        self.execute(self.rooms_request()).await
    }

    async fn check_date_availability(
        &self,
        room_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<DateAvailabilityResponse, ApiError> {
        self.execute(self.check_request(room_id, check_in, check_out))
            .await
    }

    async fn create_booking(
        &self,
        payload: &BookingPayload,
    ) -> Result<CreateBookingResponse, ApiError> {
        self.execute(self.create_request(payload)).await
    }
}
