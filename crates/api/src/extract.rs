//! Request extractors: JSON bodies with JSON errors, and the bearer-token
//! caller.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domain::{AuthError, Operation, Principal, authorize};
use serde::de::DeserializeOwned;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Like [`Json`], but a malformed body is reported as a 400 JSON error.
pub struct ApiJson<T>(pub T);

impl<T, St> FromRequest<St> for ApiJson<T>
where
    T: DeserializeOwned,
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// The caller behind the request's `Authorization: Bearer <access token>`
/// header, if any.
///
/// A missing header yields an anonymous caller. A header carrying a bad or
/// expired token is rejected with 401 even on public routes.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Principal>);

impl Caller {
    /// Checks the access policy for `op`.
    pub fn allow(&self, op: Operation) -> Result<(), ApiError> {
        Ok(authorize(op, self.0.as_ref())?)
    }

    /// Checks the access policy for `op` and returns the logged-in caller.
    pub fn require(&self, op: Operation) -> Result<&Principal, ApiError> {
        authorize(op, self.0.as_ref())?;
        self.0
            .as_ref()
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}

impl<S> FromRequestParts<Arc<AppState<S>>> for Caller
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Caller(None));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::from(AuthError::InvalidToken(
                    "Authorization header must be 'Bearer <token>'".to_string(),
                ))
            })?;

        let principal = state.auth.authenticate(token).await?;
        Ok(Caller(Some(principal)))
    }
}
