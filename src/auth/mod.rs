//! Identity / Access Gate module
//!
//! Staff accounts, token issuance, revocation and bearer validation.

mod error;
mod gate;
mod jwt;
mod password;
mod revocation;
mod users;

pub use error::{AuthError, UnauthorizedReason};
pub use gate::{bearer_token, IdentityGate};
pub use jwt::{Claims, IssuedToken, TokenService};
pub use password::{hash_password, verify_password};
pub use revocation::{
    token_fingerprint, InMemoryRevocationStore, PgRevocationStore, RevocationStore,
};
pub use users::{InMemoryUserStore, PgUserStore, StaffUser, UserStore};
