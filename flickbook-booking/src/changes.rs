use flickbook_shared::BookingChanges;
use serde_json::Value;

use crate::fields::{as_int, as_text};

/// Rejections of an update payload. Checks stop at the first problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    #[error("date cannot be empty")]
    EmptyDate,
    #[error("showtime.time cannot be empty")]
    EmptyShowtime,
    #[error("showtime.available must be an integer")]
    InvalidAvailable,
    #[error("quantity must be a positive integer")]
    InvalidQuantity,
    #[error("No valid fields provided for update")]
    NothingToUpdate,
}

/// Parses in-place booking edits.
pub struct ChangeHandler;

impl ChangeHandler {
    /// Build [`BookingChanges`] from an update payload.
    ///
    /// Only `date`, `showtime` and `quantity` are recognized. Owner fields
    /// (`user`, `username`, `booked_by`) and anything else are ignored.
    pub fn parse(payload: &Value) -> Result<BookingChanges, ChangeError> {
        let mut changes = BookingChanges::default();

        if let Some(date) = payload.get("date") {
            changes.show_date = Some(as_text(date).ok_or(ChangeError::EmptyDate)?);
        }

        if let Some(showtime) = payload.get("showtime") {
            let time = showtime.get("time").and_then(as_text);
            changes.showtime = Some(time.ok_or(ChangeError::EmptyShowtime)?);

            if let Some(available) = showtime.get("available").filter(|v| !v.is_null()) {
                changes.showtime_available = Some(as_int(available).ok_or(ChangeError::InvalidAvailable)?);
            }
        }

        if let Some(quantity) = payload.get("quantity") {
            let quantity = as_int(quantity)
                .filter(|q| *q > 0)
                .ok_or(ChangeError::InvalidQuantity)?;
            changes.quantity = Some(quantity);
        }

        if changes.is_empty() {
            return Err(ChangeError::NothingToUpdate);
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_update() {
        let changes = ChangeHandler::parse(&json!({"quantity": 4})).unwrap();
        assert_eq!(changes.quantity, Some(4));
        assert_eq!(changes.show_date, None);
        assert_eq!(changes.showtime, None);
    }

    #[test]
    fn test_showtime_with_available() {
        let changes =
            ChangeHandler::parse(&json!({"showtime": {"time": "8:30 PM", "available": "12"}})).unwrap();
        assert_eq!(changes.showtime.as_deref(), Some("8:30 PM"));
        assert_eq!(changes.showtime_available, Some(12));

        let changes =
            ChangeHandler::parse(&json!({"showtime": {"time": "8:30 PM", "available": null}})).unwrap();
        assert_eq!(changes.showtime_available, None);
    }

    #[test]
    fn test_first_error_wins() {
        let err = ChangeHandler::parse(&json!({"date": "", "quantity": -1})).unwrap_err();
        assert_eq!(err, ChangeError::EmptyDate);

        let err = ChangeHandler::parse(&json!({"showtime": null})).unwrap_err();
        assert_eq!(err, ChangeError::EmptyShowtime);

        let err = ChangeHandler::parse(&json!({"showtime": {"time": "7 PM", "available": "many"}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "showtime.available must be an integer");

        let err = ChangeHandler::parse(&json!({"quantity": "0"})).unwrap_err();
        assert_eq!(err.to_string(), "quantity must be a positive integer");
    }

    #[test]
    fn test_owner_fields_alone_are_not_an_update() {
        let err = ChangeHandler::parse(&json!({"user": "mallory", "booked_by": "mallory"})).unwrap_err();
        assert_eq!(err, ChangeError::NothingToUpdate);
    }
}
