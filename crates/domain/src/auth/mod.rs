//! Authentication, token issuance and the per-operation access policy.

mod password;
mod policy;
mod service;
mod token;

pub use password::PasswordHasher;
pub use policy::{Access, Operation, Principal, authorize};
pub use service::{AuthService, Registration, Session, UserUpdate};
pub use token::{JwtIssuer, TokenClaims, TokenIssuer, TokenKind, TokenPair};

use thiserror::Error;

/// Errors raised while authenticating or authorizing a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username/password pair didn't match.
    #[error("Invalid Credentials")]
    InvalidCredentials,

    /// The operation needs a logged-in caller.
    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    /// The caller is logged in but lacks the required role.
    #[error("You do not have permission to perform {0}")]
    Forbidden(Operation),

    /// Token is malformed, expired, of the wrong kind, or its user is gone.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Password hashing or token signing failed.
    #[error("Credential processing failed: {0}")]
    Crypto(String),
}
