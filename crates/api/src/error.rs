//! API error types with HTTP response mapping.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{AuthError, DomainError, OrderError};
use payments::PaymentError;
use serde::Serialize;
use store::StoreError;

use crate::media::MediaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Payment workflow error.
    Payment(PaymentError),
    /// Store error outside any workflow.
    Store(StoreError),
    /// Uploaded file rejected or not stored.
    Media(MediaError),
}

/// JSON error body: `{"error": ..., "details"?: ..., "fields"?: {field: [msg]}}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<&'static str, Vec<String>>>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            fields: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn with_field(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .entry(field)
            .or_default()
            .push(message.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Payment(err) => payment_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Media(err) => media_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, ErrorBody) {
    match err {
        DomainError::Validation(e) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new(e.message.clone()).with_field(e.field, e.message),
        ),
        DomainError::Order(order_err) => match &order_err {
            OrderError::InsufficientStock { .. } | OrderError::TotalOverflow => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(order_err.to_string()))
            }
            OrderError::InvalidQuantity { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(order_err.to_string()).with_field("items", order_err.to_string()),
            ),
            OrderError::ProductNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorBody::new(order_err.to_string()))
            }
        },
        DomainError::Auth(auth_err) => auth_error_to_response(auth_err),
        DomainError::NotFound { entity, .. } => (
            StatusCode::NOT_FOUND,
            ErrorBody::new(format!("{entity} not found")),
        ),
        DomainError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn auth_error_to_response(err: AuthError) -> (StatusCode, ErrorBody) {
    let status = match &err {
        AuthError::InvalidCredentials | AuthError::Unauthenticated | AuthError::InvalidToken(_) => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        AuthError::Crypto(_) => {
            tracing::error!(error = %err, "credential processing failed");
            metrics::counter!("http_internal_errors_total", "source" => "auth").increment(1);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error"),
            );
        }
    };
    (status, ErrorBody::new(err.to_string()))
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, ErrorBody) {
    match err {
        PaymentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string())),
        PaymentError::NonPositiveTotal(_) => {
            (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
        }
        PaymentError::Gateway { ref details } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(err.to_string()).with_details(details.clone()),
        ),
        PaymentError::VerificationFailed { ref details } => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new(err.to_string()).with_details(details.clone()),
        ),
        PaymentError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, ErrorBody) {
    match &err {
        StoreError::DuplicateUsername(_) => (
            StatusCode::CONFLICT,
            ErrorBody::new(err.to_string())
                .with_field("username", "A user with that username already exists."),
        ),
        StoreError::ProductInUse(_) => (StatusCode::CONFLICT, ErrorBody::new(err.to_string())),
        StoreError::ProductNotFound(_) | StoreError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string()))
        }
        StoreError::NotPending { .. } => (StatusCode::CONFLICT, ErrorBody::new(err.to_string())),
        StoreError::Corrupt(_) | StoreError::Database(_) | StoreError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            metrics::counter!("http_internal_errors_total", "source" => "store").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error"),
            )
        }
    }
}

fn media_error_to_response(err: MediaError) -> (StatusCode, ErrorBody) {
    match &err {
        MediaError::Empty | MediaError::NotAnImage => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new(err.to_string()).with_field("image", err.to_string()),
        ),
        MediaError::Io(_) => {
            tracing::error!(error = %err, "internal server error");
            metrics::counter!("http_internal_errors_total", "source" => "media").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error"),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Domain(DomainError::Auth(err))
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        ApiError::Media(err)
    }
}
