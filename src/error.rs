//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ObjectClass, ObjectId, PoolId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "invalid filter pattern for device property `vendor`: ...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One pool that failed during an incremental membership update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolFailure {
    /// Pool whose membership could not be updated.
    pub pool_id: PoolId,
    /// Rendered error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation / rules  | 400 Bad Request              |
/// | 2000–2999 | State / Not Found   | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server              | 500 / 504                    |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Pool with the given ID was not found.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    /// Inventory object with the given ID was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A regex-mode filter value does not compile.
    #[error("invalid filter pattern for {class} property `{property}`: {reason}")]
    InvalidFilterPattern {
        /// Object class the filter applies to.
        class: ObjectClass,
        /// Property the filter is attached to.
        property: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// A rule or patch references a property the object class does not define.
    #[error("unknown {class} property `{property}`")]
    UnknownProperty {
        /// Object class that was searched.
        class: ObjectClass,
        /// Offending property name.
        property: String,
    },

    /// A pool or object with the same name already exists.
    #[error("name already in use: {0}")]
    DuplicateName(String),

    /// Explicit membership assignment was attempted on a dynamic pool.
    #[error("pool {0} is dynamic; membership is derived from its rules")]
    PoolNotStatic(PoolId),

    /// Membership commit failed; previous membership is left intact.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// A pool recomputation did not finish in time.
    #[error("recompute of pool {pool_id} timed out after {timeout_secs}s")]
    RecomputeTimeout {
        /// Pool that timed out.
        pool_id: PoolId,
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// One or more pools failed to apply an incremental update.
    #[error("pool sync failed for {} pool(s)", failures.len())]
    SyncFailed {
        /// Per-pool failures.
        failures: Vec<PoolFailure>,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidFilterPattern { .. } => 1002,
            Self::UnknownProperty { .. } => 1003,
            Self::PoolNotFound(_) => 2001,
            Self::ObjectNotFound(_) => 2002,
            Self::DuplicateName(_) => 2003,
            Self::PoolNotStatic(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::RecomputeTimeout { .. } => 3002,
            Self::SyncFailed { .. } => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidFilterPattern { .. }
            | Self::UnknownProperty { .. } => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_) | Self::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateName(_) | Self::PoolNotStatic(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::SyncFailed { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::RecomputeTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Optional details rendered next to the message.
    fn details(&self) -> Option<String> {
        match self {
            Self::SyncFailed { failures } => Some(
                failures
                    .iter()
                    .map(|f| format!("{}: {}", f.pool_id, f.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let err = GatewayError::InvalidFilterPattern {
            class: ObjectClass::Device,
            property: "vendor".to_string(),
            reason: "unclosed character class".to_string(),
        };
        assert_eq!(err.error_code(), 1002);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = GatewayError::PoolNotStatic(PoolId::new());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = GatewayError::RecomputeTimeout {
            pool_id: PoolId::new(),
            timeout_secs: 5,
        };
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn messages_name_the_property() {
        let err = GatewayError::UnknownProperty {
            class: ObjectClass::Link,
            property: "vendorr".to_string(),
        };
        assert_eq!(err.to_string(), "unknown link property `vendorr`");
    }

    #[test]
    fn sync_failures_are_listed_in_details() {
        let pool_id = PoolId::new();
        let err = GatewayError::SyncFailed {
            failures: vec![PoolFailure {
                pool_id,
                message: "boom".to_string(),
            }],
        };
        assert_eq!(err.to_string(), "pool sync failed for 1 pool(s)");
        let Some(details) = err.details() else {
            panic!("expected details");
        };
        assert!(details.contains(&pool_id.to_string()));
    }

    #[test]
    fn into_response_sets_status() {
        let response = GatewayError::ObjectNotFound(ObjectId::new()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
