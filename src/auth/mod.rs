//! Token issuance and the two verification modes used by the backends.
//!
//! The user service issues tokens and verifies them in store-lookup mode
//! ([`CurrentUser`]); the product service only ever verifies them, in
//! claims-trust mode ([`AuthUser`]). Both read the same shared secret.

mod claims;
mod error;
mod extractors;
mod jwt;
pub mod password;

pub use claims::Claims;
pub use error::AuthError;
pub use extractors::{AuthUser, CurrentUser};
pub use jwt::JwtKeys;
