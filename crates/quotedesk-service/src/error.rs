//! # Service Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CoreError (quotedesk-core)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (this module) ← adds lookup and version conflicts        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError { code, message } ← serialized for the dashboard             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UI re-renders available actions or shows the form error               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use quotedesk_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Orchestrator errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// No quote with this id.
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    /// The caller acted on a stale read of the quote.
    ///
    /// ## When This Occurs
    /// - Two users press an action button on the same quote
    /// - The expiry sweep ran between render and click
    #[error("Quote {quote_id} was modified: expected version {expected}, found {actual}")]
    VersionConflict {
        quote_id: String,
        expected: u64,
        actual: u64,
    },

    /// Workflow rule violated (transition, editability, missing line item).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Convenience type alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Machine-readable error codes for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Quote or line item not found (404)
    NotFound,
    /// Input validation failed (400)
    ValidationError,
    /// Stale version (409); reload and retry
    Conflict,
    /// Status change not legal from the current status (422)
    InvalidTransition,
    /// Edit attempted on a read-only quote (422)
    NotEditable,
    /// Audit trail inconsistent (500)
    Internal,
}

/// Error payload returned to the frontend.
///
/// ```json
/// { "code": "INVALID_TRANSITION", "message": "Invalid status transition from ACCEPTED to SENT" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::QuoteNotFound(_) => ErrorCode::NotFound,
            ServiceError::VersionConflict { .. } => ErrorCode::Conflict,
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::Core(core) => match core {
                CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
                CoreError::NotEditable { .. } => ErrorCode::NotEditable,
                CoreError::LineItemNotFound { .. } => ErrorCode::NotFound,
                CoreError::HistoryMismatch { .. } => ErrorCode::Internal,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        if err.code() == ErrorCode::Internal {
            tracing::error!(error = %err, "Internal quote error");
        }
        ApiError {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
