pub mod changes;
pub mod fields;
pub mod policy;
pub mod reconcile;
pub mod validator;

pub use changes::{ChangeError, ChangeHandler};
pub use policy::{require_admin, require_identity, AccessError, BookingAction, BookingPolicy};
pub use reconcile::{CheckoutTerms, Reconciled, Reconciler};
pub use validator::{BookingValidator, ValidationErrors};
