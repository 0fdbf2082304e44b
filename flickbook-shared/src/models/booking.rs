use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored seat booking.
///
/// `movie_title` and `booked_by` are weak references by value: they are
/// matched as plain strings against movies and users and are never updated
/// or cascaded when the referenced row changes (except user deletion, which
/// removes bookings by owner name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub movie_title: String,
    /// ISO calendar date as submitted.
    pub show_date: String,
    /// Free-text showtime label, e.g. "7:00 PM".
    pub showtime: String,
    /// Advisory seat count captured at booking time. Never decremented.
    pub showtime_available: Option<i32>,
    pub quantity: i32,
    pub booked_by: String,
    pub created_at: DateTime<Utc>,
}

/// A validated booking that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub movie_title: String,
    pub show_date: String,
    pub showtime: String,
    pub showtime_available: Option<i32>,
    pub quantity: i32,
    pub booked_by: String,
}

impl NewBooking {
    /// Whether `booking` records the same purchase (owner, movie, date, showtime, quantity).
    pub fn matches(&self, booking: &Booking) -> bool {
        booking.movie_title == self.movie_title
            && booking.show_date == self.show_date
            && booking.showtime == self.showtime
            && booking.booked_by == self.booked_by
            && booking.quantity == self.quantity
    }
}

/// In-place edits allowed on an existing booking. There is no
/// owner field: the owner of a booking is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingChanges {
    pub show_date: Option<String>,
    pub showtime: Option<String>,
    pub showtime_available: Option<i32>,
    pub quantity: Option<i32>,
}

impl BookingChanges {
    pub fn is_empty(&self) -> bool {
        self.show_date.is_none()
            && self.showtime.is_none()
            && self.showtime_available.is_none()
            && self.quantity.is_none()
    }
}

impl Booking {
    pub fn apply(&mut self, changes: &BookingChanges) {
        if let Some(date) = &changes.show_date {
            self.show_date = date.clone();
        }
        if let Some(time) = &changes.showtime {
            self.showtime = time.clone();
        }
        if let Some(available) = changes.showtime_available {
            self.showtime_available = Some(available);
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
    }
}

/// Wire shape of a booking in API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingView {
    pub id: i64,
    pub movie_title: String,
    pub date: String,
    pub showtime: ShowtimeView,
    pub quantity: i32,
    pub user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowtimeView {
    pub time: String,
    pub available: Option<i32>,
}

impl From<&Booking> for BookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            movie_title: booking.movie_title.clone(),
            date: booking.show_date.clone(),
            showtime: ShowtimeView {
                time: booking.showtime.clone(),
                available: booking.showtime_available,
            },
            quantity: booking.quantity,
            user: booking.booked_by.clone(),
            created_at: booking.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Booking {
        Booking {
            id: 7,
            movie_title: "Interstellar".to_string(),
            show_date: "2025-02-01".to_string(),
            showtime: "7:00 PM".to_string(),
            showtime_available: Some(10),
            quantity: 2,
            booked_by: "alice".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut booking = stored();
        booking.apply(&BookingChanges {
            quantity: Some(5),
            ..Default::default()
        });

        assert_eq!(booking.quantity, 5);
        assert_eq!(booking.show_date, "2025-02-01");
        assert_eq!(booking.showtime_available, Some(10));
        assert_eq!(booking.booked_by, "alice");
    }

    #[test]
    fn test_match_ignores_available_count() {
        let booking = stored();
        let mut candidate = NewBooking {
            movie_title: "Interstellar".to_string(),
            show_date: "2025-02-01".to_string(),
            showtime: "7:00 PM".to_string(),
            showtime_available: None,
            quantity: 2,
            booked_by: "alice".to_string(),
        };
        assert!(candidate.matches(&booking));

        candidate.quantity = 3;
        assert!(!candidate.matches(&booking));
    }

    #[test]
    fn test_view_uses_wire_names() {
        let value = serde_json::to_value(BookingView::from(&stored())).unwrap();
        assert_eq!(value["date"], "2025-02-01");
        assert_eq!(value["showtime"]["time"], "7:00 PM");
        assert_eq!(value["showtime"]["available"], 10);
        assert_eq!(value["user"], "alice");
    }
}
