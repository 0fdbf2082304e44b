use flickbook_core::repository::{BookingRepository, RepoError};
use flickbook_shared::{Booking, Identity};
use std::sync::Arc;

/// What a caller wants to do with an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    View,
    /// Self-service edit; owner only.
    Update,
    /// Edit through the admin-capable route; owner or any admin.
    Edit,
    Cancel,
}

impl BookingAction {
    fn admin_allowed(self) -> bool {
        !matches!(self, BookingAction::Update)
    }

    fn denied_message(self) -> &'static str {
        match self {
            BookingAction::View => "Not authorized to view this booking",
            BookingAction::Update | BookingAction::Edit => "Not authorized to update this booking",
            BookingAction::Cancel => "Not authorized to cancel this booking",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Admin access required")]
    AdminRequired,
    #[error("Booking not found")]
    NotFound,
    #[error("{}", .0.denied_message())]
    Forbidden(BookingAction),
    #[error("booking store failure: {0}")]
    Store(#[from] RepoError),
}

pub fn require_identity(identity: Option<&Identity>) -> Result<&Identity, AccessError> {
    identity.ok_or(AccessError::Unauthenticated)
}

pub fn require_admin(identity: Option<&Identity>) -> Result<&Identity, AccessError> {
    let identity = require_identity(identity)?;
    if identity.is_admin() {
        Ok(identity)
    } else {
        Err(AccessError::AdminRequired)
    }
}

/// Whether `identity` may perform `action` on `booking`.
pub fn permits(identity: &Identity, booking: &Booking, action: BookingAction) -> bool {
    booking.booked_by == identity.username || (action.admin_allowed() && identity.is_admin())
}

/// Ownership and role gate in front of the booking store.
#[derive(Clone)]
pub struct BookingPolicy {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingPolicy {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Load booking `id` for `action`. Identity is checked before the lookup,
    /// the lookup before ownership.
    pub async fn load(
        &self,
        identity: Option<&Identity>,
        id: i64,
        action: BookingAction,
    ) -> Result<Booking, AccessError> {
        let identity = require_identity(identity)?;
        let booking = self.bookings.get_booking(id).await?.ok_or(AccessError::NotFound)?;

        if permits(identity, &booking, action) {
            Ok(booking)
        } else {
            Err(AccessError::Forbidden(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flickbook_shared::{NewBooking, Role};
    use flickbook_store::MemoryStore;

    async fn seeded() -> (BookingPolicy, i64) {
        let store = MemoryStore::new();
        let booking = store
            .create_booking(&NewBooking {
                movie_title: "Heat".to_string(),
                show_date: "2030-03-01".to_string(),
                showtime: "7:00 PM".to_string(),
                showtime_available: None,
                quantity: 2,
                booked_by: "alice".to_string(),
            })
            .await
            .unwrap();
        (BookingPolicy::new(Arc::new(store)), booking.id)
    }

    #[tokio::test]
    async fn test_owner_allowed_everything() {
        let (policy, id) = seeded().await;
        let alice = Identity::new("alice", Role::User);
        for action in [BookingAction::View, BookingAction::Update, BookingAction::Edit, BookingAction::Cancel] {
            assert!(policy.load(Some(&alice), id, action).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_stranger_forbidden() {
        let (policy, id) = seeded().await;
        let mallory = Identity::new("mallory", Role::User);
        let err = policy.load(Some(&mallory), id, BookingAction::Cancel).await.unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to cancel this booking");
        let err = policy.load(Some(&mallory), id, BookingAction::Update).await.unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to update this booking");
    }

    #[tokio::test]
    async fn test_admin_cannot_use_self_service_update() {
        let (policy, id) = seeded().await;
        let root = Identity::new("root", Role::Admin);
        assert!(policy.load(Some(&root), id, BookingAction::Edit).await.is_ok());
        assert!(policy.load(Some(&root), id, BookingAction::Cancel).await.is_ok());
        assert!(matches!(
            policy.load(Some(&root), id, BookingAction::Update).await,
            Err(AccessError::Forbidden(BookingAction::Update))
        ));
    }

    #[tokio::test]
    async fn test_status_precedence() {
        let (policy, _) = seeded().await;
        assert!(matches!(
            policy.load(None, 999, BookingAction::View).await,
            Err(AccessError::Unauthenticated)
        ));
        let alice = Identity::new("alice", Role::User);
        assert!(matches!(
            policy.load(Some(&alice), 999, BookingAction::View).await,
            Err(AccessError::NotFound)
        ));
    }

    #[test]
    fn test_require_admin() {
        let user = Identity::new("alice", Role::User);
        assert!(matches!(require_admin(None), Err(AccessError::Unauthenticated)));
        assert!(matches!(require_admin(Some(&user)), Err(AccessError::AdminRequired)));
        assert!(require_admin(Some(&Identity::new("root", Role::Admin))).is_ok());
    }
}
