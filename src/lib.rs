// Room availability, date selection, pricing and booking engine

pub mod api;
pub mod availability;
pub mod booking;
pub mod calendar_grid;
pub mod http;
pub mod logging;
pub mod pricing;
pub mod selection;
pub mod session;

#[cfg(test)]
mod selection_proptest;

// Re-export key types for convenience
pub use api::{ApiError, BookingApi, ClientConfig, ClientError, Room};
pub use availability::{
    AvailabilityDay, AvailabilityFetcher, AvailabilitySnapshot, FetchError, SnapshotSource,
};
pub use booking::{
    BookingConfirmation, BookingForm, BookingPayload, BookingSubmitter, FormError,
    SubmissionError,
};
pub use calendar_grid::{build_weeks, CalendarCell, CalendarWeek, DayView};
pub use http::HttpBookingApi;
pub use pricing::{BookingQuote, GuestComposition, PricingError, TAX_RATE};
pub use selection::{
    ClickOutcome, DateRange, SelectionError, SelectionPhase, SelectionState,
    SelectionStateMachine,
};
pub use session::{AvailabilityRequest, BookingSession};
