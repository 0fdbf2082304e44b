pub mod models;
pub mod pii;

pub use models::booking::{Booking, BookingChanges, BookingView, NewBooking, ShowtimeView};
pub use models::movie::{Movie, MovieChanges, NewMovie};
pub use models::user::{Identity, NewUser, Role, User};
