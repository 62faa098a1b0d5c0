// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the engine and its gateways.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Persistence gateway unreachable: {0}")]
    Connectivity(String),

    #[error("Gateway returned HTTP {status}: {body}")]
    GatewayStatus { status: u16, body: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Advisory service error: {0}")]
    Advisory(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error means the persistence collaborator could not be
    /// reached at all (as opposed to rejecting a request).
    pub fn is_connectivity(&self) -> bool {
        match self {
            AppError::Connectivity(_) | AppError::Database(_) => true,
            AppError::GatewayStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Result type alias for engine and gateway operations
pub type Result<T> = std::result::Result<T, AppError>;
