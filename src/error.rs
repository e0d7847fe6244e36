// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent caller-facing bodies.

use serde::Serialize;

/// Application error type shared by the store, identity and scoring layers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired credential: {0}")]
    InvalidToken(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error body handed to whatever transport embeds this crate.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Persistence or identity-provider faults, reported opaquely.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::IdentityProvider(_) | AppError::Internal(_)
        )
    }

    /// Build the caller-facing body, logging upstream faults.
    ///
    /// Validation and not-found errors carry enough detail to fix the request;
    /// upstream faults never leak their cause.
    pub fn to_error_body(&self) -> ErrorBody {
        let (error, details) = match self {
            AppError::Unauthorized => ("unauthorized", None),
            AppError::InvalidToken(_) => ("invalid_token", None),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone())),
            AppError::Validation(msg) => ("validation_failed", Some(msg.clone())),
            AppError::Conflict(msg) => ("conflict", Some(msg.clone())),
            AppError::IdentityProvider(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                ("upstream_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("upstream_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                ("upstream_error", None)
            }
        };

        ErrorBody {
            error: error.to_string(),
            details,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
