use flickbook_core::payment::{CheckoutMetadata, CheckoutRequest};
use flickbook_core::repository::{BookingRepository, RepoResult};
use flickbook_shared::{Booking, NewBooking};
use std::sync::Arc;
use tracing::{debug, info};

const MOVIE_TITLE: &str = "movie_title";
const DATE: &str = "date";
const SHOWTIME: &str = "showtime";
const SHOWTIME_AVAILABLE: &str = "showtime_available";
const QUANTITY: &str = "quantity";
const USER: &str = "user";

/// Booking fields carried through a checkout session.
pub fn checkout_metadata(booking: &NewBooking) -> CheckoutMetadata {
    let mut metadata = CheckoutMetadata::new();
    metadata.insert(MOVIE_TITLE.to_string(), booking.movie_title.clone());
    metadata.insert(DATE.to_string(), booking.show_date.clone());
    metadata.insert(SHOWTIME.to_string(), booking.showtime.clone());
    if let Some(available) = booking.showtime_available {
        metadata.insert(SHOWTIME_AVAILABLE.to_string(), available.to_string());
    }
    metadata.insert(QUANTITY.to_string(), booking.quantity.to_string());
    metadata.insert(USER.to_string(), booking.booked_by.clone());
    metadata
}

/// Rebuild a booking from session metadata. `None` when a required key is
/// missing or blank, or the quantity is not a positive integer.
pub fn booking_from_metadata(metadata: &CheckoutMetadata) -> Option<NewBooking> {
    let field = |key: &str| {
        metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let quantity = field(QUANTITY)?.parse::<i32>().ok().filter(|q| *q > 0)?;
    Some(NewBooking {
        movie_title: field(MOVIE_TITLE)?,
        show_date: field(DATE)?,
        showtime: field(SHOWTIME)?,
        showtime_available: field(SHOWTIME_AVAILABLE).and_then(|v| v.parse().ok()),
        quantity,
        booked_by: field(USER)?,
    })
}

/// Price and return URLs for hosted checkout.
#[derive(Debug, Clone)]
pub struct CheckoutTerms {
    pub unit_amount: i64,
    pub currency: String,
    /// Base URL the provider sends the buyer back to.
    pub public_url: String,
}

impl CheckoutTerms {
    pub fn request_for(&self, booking: &NewBooking) -> CheckoutRequest {
        let base = self.public_url.trim_end_matches('/');
        CheckoutRequest {
            product_name: booking.movie_title.clone(),
            unit_amount: self.unit_amount,
            currency: self.currency.clone(),
            quantity: booking.quantity,
            metadata: checkout_metadata(booking),
            success_url: format!("{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}", base),
            cancel_url: format!("{}/checkout/cancel", base),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    Inserted(Booking),
    /// A matching booking already existed (the other trigger got there first).
    AlreadyPersisted(Booking),
    /// Metadata was incomplete; nothing was written.
    MissingMetadata,
}

impl Reconciled {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            Reconciled::Inserted(b) | Reconciled::AlreadyPersisted(b) => Some(b),
            Reconciled::MissingMetadata => None,
        }
    }
}

/// Turns completed checkout sessions into bookings.
///
/// Both the success redirect and the webhook call [`Reconciler::persist`];
/// whichever runs second finds the first one's booking and writes nothing.
/// There is no lock between the lookup and the insert.
#[derive(Clone)]
pub struct Reconciler {
    bookings: Arc<dyn BookingRepository>,
}

impl Reconciler {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    pub async fn persist(&self, metadata: &CheckoutMetadata) -> RepoResult<Reconciled> {
        let Some(candidate) = booking_from_metadata(metadata) else {
            debug!("Checkout metadata incomplete: {:?}", metadata.keys().collect::<Vec<_>>());
            return Ok(Reconciled::MissingMetadata);
        };

        if let Some(existing) = self.bookings.find_matching(&candidate).await? {
            debug!("Checkout already persisted as booking {}", existing.id);
            return Ok(Reconciled::AlreadyPersisted(existing));
        }

        let booking = self.bookings.create_booking(&candidate).await?;
        info!(
            "Booking {} persisted from checkout for {} ({} x {})",
            booking.id, booking.booked_by, booking.quantity, booking.movie_title
        );
        Ok(Reconciled::Inserted(booking))
    }
}
