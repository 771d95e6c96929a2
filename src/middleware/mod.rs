pub mod auth;
pub mod ownership;

pub use auth::{AuthenticationGate, UserLookup, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use ownership::{OwnerLookup, OwnershipGate};
