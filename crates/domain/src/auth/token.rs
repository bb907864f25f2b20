use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use store::User;

use super::AuthError;

/// Which half of a token pair a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub is_admin: bool,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// A refresh/access token pair handed out on login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Issues and checks bearer tokens.
pub trait TokenIssuer: Send + Sync {
    /// Issues a fresh refresh/access pair for the user.
    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError>;

    /// Issues a new access token (used by the refresh flow).
    fn issue_access(&self, user: &User) -> Result<String, AuthError>;

    /// Validates signature, expiry and kind, returning the claims.
    fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError>;
}

/// HS256 JWT issuer with separate lifetimes for access and refresh tokens.
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(&self, user: &User, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = TokenClaims {
            sub: user.id.as_i64(),
            username: user.username.clone(),
            is_admin: user.is_staff,
            token_type: kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            refresh: self.sign(user, TokenKind::Refresh)?,
            access: self.sign(user, TokenKind::Access)?,
        })
    }

    fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        self.sign(user, TokenKind::Access)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken(format!(
                "expected {expected:?} token"
            )));
        }
        Ok(data.claims)
    }
}
