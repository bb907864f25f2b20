//! Registration, login, token refresh and admin user management.

use std::sync::Arc;

use common::UserId;
use store::{NewUser, Store, User, UserChanges};

use crate::error::{DomainError, ValidationError};

use super::{AuthError, PasswordHasher, Principal, TokenIssuer, TokenKind, TokenPair};

const GMAIL_SUFFIX: &str = "@gmail.com";
const GMAIL_ONLY: &str = "Only Gmail accounts are allowed for registration.";
const REQUIRED: &str = "This field is required.";

/// Self-registration request. `is_staff` is never taken from callers.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// What a successful login or registration hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub tokens: TokenPair,
    pub username: String,
    pub is_admin: bool,
    pub user_id: UserId,
}

/// Admin edit of a user. `None` leaves the field unchanged; a new password is
/// re-hashed.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
}

/// Service for accounts and credentials.
pub struct AuthService<S: Store> {
    store: S,
    tokens: Arc<dyn TokenIssuer>,
    hasher: PasswordHasher,
}

impl<S: Store> AuthService<S> {
    pub fn new(store: S, tokens: Arc<dyn TokenIssuer>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    /// Creates a customer account and logs it in.
    #[tracing::instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<Session, DomainError> {
        let username = registration.username.trim();
        if username.is_empty() {
            return Err(ValidationError::new("username", REQUIRED).into());
        }
        let email = validate_email(registration.email.as_deref())?;
        let password = registration
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::new("password", REQUIRED))?;

        let password_hash = self.hasher.hash_off_thread(password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email,
                password_hash,
                is_staff: false,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        metrics::counter!("users_registered_total").increment(1);
        self.session_for(&user)
    }

    /// Exchanges a username/password pair for a token pair.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, DomainError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = self
            .hasher
            .verify_off_thread(password.to_string(), user.password_hash.clone())
            .await?;
        if !matches {
            tracing::info!("login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        self.session_for(&user)
    }

    /// Issues a fresh access token for a valid refresh token.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, DomainError> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user = self.user_for_claims(claims.sub).await?;
        Ok(self.tokens.issue_access(&user)?)
    }

    /// Resolves a bearer access token to the caller it belongs to.
    ///
    /// The role comes from the stored user, so a demoted admin loses access
    /// as soon as their account changes.
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal, DomainError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        let user = self.user_for_claims(claims.sub).await?;
        Ok(Principal {
            user_id: user.id,
            username: user.username,
            is_admin: user.is_staff,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.store.list_users().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, DomainError> {
        let username = match update.username {
            Some(name) if name.trim().is_empty() => {
                return Err(ValidationError::new("username", REQUIRED).into());
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let email = match update.email {
            Some(email) => Some(validate_email(Some(&email))?),
            None => None,
        };
        let password_hash = match update.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(self.hasher.hash_off_thread(password).await?),
            None => None,
        };

        let changes = UserChanges {
            username,
            email,
            password_hash,
            is_staff: update.is_staff,
        };
        let user = self
            .store
            .update_user(id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))?;

        tracing::info!(user_id = %id, "user updated");
        Ok(user)
    }

    /// Deletes a user together with their orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), DomainError> {
        if !self.store.delete_user(id).await? {
            return Err(DomainError::not_found("User", id));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    fn session_for(&self, user: &User) -> Result<Session, DomainError> {
        Ok(Session {
            tokens: self.tokens.issue_pair(user)?,
            username: user.username.clone(),
            is_admin: user.is_staff,
            user_id: user.id,
        })
    }

    async fn user_for_claims(&self, sub: i64) -> Result<User, DomainError> {
        self.store
            .get_user(UserId::new(sub))
            .await?
            .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()).into())
    }
}

/// Empty means "no email"; anything else must be a Gmail address.
fn validate_email(email: Option<&str>) -> Result<String, ValidationError> {
    match email.map(str::trim) {
        None | Some("") => Ok(String::new()),
        Some(email) if email.ends_with(GMAIL_SUFFIX) => Ok(email.to_string()),
        Some(_) => Err(ValidationError::new("email", GMAIL_ONLY)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rule() {
        assert_eq!(validate_email(None), Ok(String::new()));
        assert_eq!(validate_email(Some("")), Ok(String::new()));
        assert_eq!(
            validate_email(Some("asha@gmail.com")),
            Ok("asha@gmail.com".to_string())
        );
        assert_eq!(
            validate_email(Some("asha@yahoo.com")),
            Err(ValidationError::new("email", GMAIL_ONLY))
        );
        assert!(validate_email(Some("asha@gmail.com.evil.io")).is_err());
    }
}
