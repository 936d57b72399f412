// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid activity type: {0}")]
    InvalidActivityType(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("You have already joined this competition")]
    AlreadyJoined,

    #[error("This email address has already been invited")]
    DuplicateInvitation,

    #[error("You have already given kudos for this activity")]
    DuplicateKudos,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidActivityType(_) => "invalid_activity_type",
            AppError::InvalidValue(_) => "invalid_value",
            AppError::InvalidDate(_) => "invalid_date",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::AlreadyJoined => "already_joined",
            AppError::DuplicateInvitation => "duplicate_invitation",
            AppError::DuplicateKudos => "duplicate_kudos",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::InvalidActivityType(_)
            | AppError::InvalidValue(_)
            | AppError::InvalidDate(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::AlreadyJoined
            | AppError::DuplicateInvitation
            | AppError::DuplicateKudos
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StoreError::UniqueViolation { constraint } => AppError::Conflict(constraint),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            AppError::Unauthorized | AppError::InvalidToken => None,
            AppError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Store unavailable");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            AppError::InvalidActivityType(msg)
            | AppError::InvalidValue(msg)
            | AppError::InvalidDate(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg) => Some(msg.clone()),
            AppError::AlreadyJoined
            | AppError::DuplicateInvitation
            | AppError::DuplicateKudos
            | AppError::Conflict(_) => Some(self.to_string()),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
