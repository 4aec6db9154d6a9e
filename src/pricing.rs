// Booking quote: nights, base price, tax and total for a finalized range

use crate::selection::DateRange;
use chrono::NaiveDate;
use thiserror::Error;

// Flat tax applied to every stay
pub const TAX_RATE: f64 = 0.12;

pub const MAX_ROOMS: u32 = 6;
pub const GUESTS_PER_ROOM: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("Booking must be for at least 1 night")]
    NoNights,

    #[error("At least 1 room required")]
    NoRooms,

    #[error("Number of children ({children}) cannot exceed total guests ({guests})")]
    TooManyChildren { guests: u32, children: u32 },
}

// Whole calendar days between the two dates, order-insensitive
pub fn calculate_nights(check_in: NaiveDate, check_out: NaiveDate) -> u32 {
    (check_out - check_in).num_days().unsigned_abs() as u32
}

// Rooms needed at three guests per room, capped at the per-booking maximum
pub fn suggested_room_count(guests: u32) -> u32 {
    if guests == 0 {
        return 1;
    }
    guests.div_ceil(GUESTS_PER_ROOM).min(MAX_ROOMS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestComposition {
    guests: u32,
    children: u32,
}

impl GuestComposition {
    pub fn new(guests: u32, children: u32) -> Result<Self, PricingError> {
        if children > guests {
            return Err(PricingError::TooManyChildren { guests, children });
        }
        Ok(Self { guests, children })
    }

    pub fn guests(&self) -> u32 {
        self.guests
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn adults(&self) -> u32 {
        self.guests - self.children
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingQuote {
    pub nights: u32,
    pub rooms_requested: u32,
    pub price_per_night: f64,
    pub base_price: f64,
    pub tax_amount: f64,
    pub total_price: f64,
}

pub fn quote(
    check_in: NaiveDate,
    check_out: NaiveDate,
    price_per_night: f64,
    number_of_rooms: u32,
) -> Result<BookingQuote, PricingError> {
    let nights = calculate_nights(check_in, check_out);
    if nights < 1 {
        return Err(PricingError::NoNights);
    }
    if number_of_rooms < 1 {
        return Err(PricingError::NoRooms);
    }

    let base_price = price_per_night * nights as f64 * number_of_rooms as f64;
    let tax_amount = (base_price * TAX_RATE).round();

    Ok(BookingQuote {
        nights,
        rooms_requested: number_of_rooms,
        price_per_night,
        base_price,
        tax_amount,
        total_price: base_price + tax_amount,
    })
}

pub fn quote_range(
    range: &DateRange,
    price_per_night: f64,
    number_of_rooms: u32,
) -> Result<BookingQuote, PricingError> {
    quote(range.check_in(), range.check_out(), price_per_night, number_of_rooms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_quote_two_rooms_three_nights() {
        let quote = quote(date(2026, 1, 18), date(2026, 1, 21), 3500.0, 2).unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.rooms_requested, 2);
        assert_eq!(quote.base_price, 21000.0);
        assert_eq!(quote.tax_amount, 2520.0);
        assert_eq!(quote.total_price, 23520.0);
    }

    #[test_case(3333.0, 1, 1, 400.0, 3733.0; "#1 tax rounds up")]
    #[test_case(4200.0, 2, 1, 1008.0, 9408.0; "#2 whole tax")]
    #[test_case(1001.0, 1, 1, 120.0, 1121.0; "#3 tax rounds down")]
    #[test_case(5500.0, 7, 3, 13860.0, 129360.0; "#4 week for three rooms")]
    fn test_quote_rounding(price: f64, nights: i64, rooms: u32, tax: f64, total: f64) {
        let check_in = date(2026, 3, 1);
        let check_out = check_in + chrono::Duration::days(nights);
        let quote = quote(check_in, check_out, price, rooms).unwrap();
        assert_eq!(quote.tax_amount, tax);
        assert_eq!(quote.total_price, total);
    }

    #[test]
    fn test_quote_needs_a_night_and_a_room() {
        tokio_test::assert_ok!(quote(date(2026, 3, 1), date(2026, 3, 2), 3500.0, 1));
        tokio_test::assert_err!(quote(date(2026, 3, 1), date(2026, 3, 1), 3500.0, 1));
        assert_eq!(
            quote(date(2026, 3, 1), date(2026, 3, 1), 3500.0, 1),
            Err(PricingError::NoNights)
        );
        assert_eq!(
            quote(date(2026, 3, 1), date(2026, 3, 2), 3500.0, 0),
            Err(PricingError::NoRooms)
        );
    }

    #[test]
    fn test_nights_ignore_order() {
        assert_eq!(calculate_nights(date(2026, 3, 5), date(2026, 3, 1)), 4);
        assert_eq!(calculate_nights(date(2026, 2, 27), date(2026, 3, 2)), 3);
    }

    #[test]
    fn test_quote_from_range() {
        let range = DateRange::new(date(2026, 12, 30), date(2027, 1, 2)).unwrap();
        let quote = quote_range(&range, 1000.0, 1).unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.total_price, 3360.0);
    }

    #[test]
    fn test_children_cannot_exceed_guests() {
        assert_eq!(
            GuestComposition::new(5, 6),
            Err(PricingError::TooManyChildren {
                guests: 5,
                children: 6
            })
        );

        let family = GuestComposition::new(5, 2).unwrap();
        assert_eq!(family.adults(), 3);
        assert_eq!(GuestComposition::new(4, 4).unwrap().adults(), 0);
    }

    #[test_case(0, 1; "#1 no guests still needs a room")]
    #[test_case(1, 1; "#2 single")]
    #[test_case(3, 1; "#3 full room")]
    #[test_case(4, 2; "#4 spills over")]
    #[test_case(18, 6; "#5 exactly max")]
    #[test_case(20, 6; "#6 capped")]
    fn test_suggested_room_count(guests: u32, expected: u32) {
        assert_eq!(suggested_room_count(guests), expected);
    }
}
