use flickbook_shared::NewBooking;
use serde_json::Value;
use std::fmt;

use crate::fields::{as_int, as_text, first_text};

/// Every problem found in a booking submission, in reporting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid booking payload: {}", self.0.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// Normalizes raw booking submissions.
pub struct BookingValidator;

impl BookingValidator {
    /// Validate `payload` into a [`NewBooking`].
    ///
    /// The owner is taken from `user`, then `username`, then
    /// `fallback_owner` (the caller's session user on the self-service
    /// route). All violations are collected; nothing is returned partially.
    pub fn validate(payload: &Value, fallback_owner: Option<&str>) -> Result<NewBooking, ValidationErrors> {
        let empty = Value::Null;
        let movie_title = first_text(payload, &["movie_title"]);
        let show_date = first_text(payload, &["date", "data"]);

        let showtime = payload.get("showtime").unwrap_or(&empty);
        let showtime_time = showtime.get("time").and_then(as_text);
        let available_raw = showtime.get("available").filter(|v| !v.is_null());

        let booked_by = first_text(payload, &["user", "username"])
            .or_else(|| fallback_owner.filter(|u| !u.is_empty()).map(str::to_string));

        let mut errors = Vec::new();
        if movie_title.is_none() {
            errors.push("movie_title is required.".to_string());
        }
        if show_date.is_none() {
            errors.push("date is required.".to_string());
        }
        if showtime_time.is_none() {
            errors.push("showtime.time is required.".to_string());
        }
        if booked_by.is_none() {
            errors.push("user is required.".to_string());
        }

        let quantity = payload.get("quantity").and_then(as_int).filter(|q| *q > 0);
        if quantity.is_none() {
            errors.push("quantity must be a positive integer.".to_string());
        }

        let showtime_available = match available_raw {
            None => None,
            Some(raw) => {
                let parsed = as_int(raw);
                if parsed.is_none() {
                    errors.push("showtime.available must be an integer.".to_string());
                }
                parsed
            }
        };

        match (movie_title, show_date, showtime_time, booked_by, quantity) {
            (Some(movie_title), Some(show_date), Some(showtime), Some(booked_by), Some(quantity))
                if errors.is_empty() =>
            {
                Ok(NewBooking {
                    movie_title,
                    show_date,
                    showtime,
                    showtime_available,
                    quantity,
                    booked_by,
                })
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let payload = json!({
            "movie_title": "X",
            "date": "2025-02-01",
            "showtime": {"time": "7:00 PM", "available": 10},
            "quantity": 2,
            "user": "alice"
        });
        let booking = BookingValidator::validate(&payload, None).unwrap();
        assert_eq!(booking.quantity, 2);
        assert_eq!(booking.booked_by, "alice");
        assert_eq!(booking.showtime, "7:00 PM");
        assert_eq!(booking.showtime_available, Some(10));
    }

    #[test]
    fn test_collects_all_errors_in_order() {
        let payload = json!({"showtime": {"available": "lots"}, "quantity": 0});
        let errors = BookingValidator::validate(&payload, None).unwrap_err();
        assert_eq!(
            errors.messages(),
            &[
                "movie_title is required.",
                "date is required.",
                "showtime.time is required.",
                "user is required.",
                "quantity must be a positive integer.",
                "showtime.available must be an integer.",
            ]
        );
    }

    #[test]
    fn test_quantity_failures_share_one_message() {
        for quantity in [json!("abc"), json!(-3), json!(0), json!(null), json!(true)] {
            let payload = json!({
                "movie_title": "X",
                "date": "2025-02-01",
                "showtime": {"time": "7:00 PM"},
                "quantity": quantity,
                "user": "alice"
            });
            let errors = BookingValidator::validate(&payload, None).unwrap_err();
            assert_eq!(errors.messages(), &["quantity must be a positive integer."]);
        }
    }

    #[test]
    fn test_legacy_aliases_and_owner_priority() {
        let payload = json!({
            "movie_title": "X",
            "data": "2025-02-01",
            "showtime": {"time": "9:15 PM"},
            "quantity": "3",
            "username": "bob"
        });
        let booking = BookingValidator::validate(&payload, Some("carol")).unwrap();
        assert_eq!(booking.show_date, "2025-02-01");
        assert_eq!(booking.booked_by, "bob");
        assert_eq!(booking.quantity, 3);
        assert_eq!(booking.showtime_available, None);
    }

    #[test]
    fn test_session_owner_is_last_resort() {
        let payload = json!({
            "movie_title": "X",
            "date": "2025-02-01",
            "showtime": {"time": "9:15 PM"},
            "quantity": 1
        });
        assert_eq!(
            BookingValidator::validate(&payload, Some("carol")).unwrap().booked_by,
            "carol"
        );
        assert_eq!(
            BookingValidator::validate(&payload, None).unwrap_err().messages(),
            &["user is required."]
        );
    }

    #[test]
    fn test_non_object_payload() {
        let errors = BookingValidator::validate(&json!("nope"), Some("carol")).unwrap_err();
        assert_eq!(errors.messages().len(), 4);
    }
}
