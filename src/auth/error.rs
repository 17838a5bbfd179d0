//! Authentication errors

use std::fmt;

use crate::store::StoreError;

/// Why a credential was refused. Clients retry differently on expiry
/// (refresh and retry) than on an invalid token (re-login).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    Missing,
    Expired,
    Invalid,
}

impl UnauthorizedReason {
    pub fn error_code(&self) -> &'static str {
        match self {
            UnauthorizedReason::Missing => "missing_token",
            UnauthorizedReason::Expired => "token_expired",
            UnauthorizedReason::Invalid => "invalid_token",
        }
    }
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::Missing => write!(f, "bearer token is missing"),
            UnauthorizedReason::Expired => write!(f, "token has expired"),
            UnauthorizedReason::Invalid => write!(f, "token is invalid"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Failed to issue token: {0}")]
    TokenEncoding(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<UnauthorizedReason> for AuthError {
    fn from(reason: UnauthorizedReason) -> Self {
        AuthError::Unauthorized(reason)
    }
}
