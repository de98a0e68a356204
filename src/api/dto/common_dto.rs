//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{GatewayError, PoolFailure};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

const fn default_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Cuts one page out of `items`.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = total.div_ceil(params.per_page);
        let start = usize::try_from(
            u64::from(params.page.saturating_sub(1)) * u64::from(params.per_page),
        )
        .unwrap_or(usize::MAX);
        let per_page = usize::try_from(params.per_page).unwrap_or(usize::MAX);
        let data = items.into_iter().skip(start).take(per_page).collect();
        (
            data,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}

/// Query flag for inventory mutations.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SuppressParams {
    /// Skip the pool membership update for this change.
    #[serde(default)]
    pub suppress_pool_sync: bool,
}

/// Outcome of the pool membership update triggered by an inventory change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolSyncStatus {
    /// `true` when every pool was updated.
    pub ok: bool,
    /// Error message when the update failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pools that could not be updated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PoolFailure>,
}

impl From<&Result<(), GatewayError>> for PoolSyncStatus {
    fn from(outcome: &Result<(), GatewayError>) -> Self {
        match outcome {
            Ok(()) => Self {
                ok: true,
                error: None,
                failures: Vec::new(),
            },
            Err(e) => Self {
                ok: false,
                error: Some(e.to_string()),
                failures: match e {
                    GatewayError::SyncFailed { failures } => failures.clone(),
                    _ => Vec::new(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PoolId;

    #[test]
    fn paginate_cuts_requested_page() {
        let params = PaginationParams {
            page: 2,
            per_page: 2,
        };
        let (data, meta) = params.paginate(vec![1, 2, 3, 4, 5]);
        assert_eq!(data, vec![3, 4]);
        assert_eq!(meta.total, 5);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let params = PaginationParams {
            page: 9,
            per_page: 500,
        };
        let (data, meta) = params.paginate(vec!["a"]);
        assert!(data.is_empty());
        assert_eq!(meta.per_page, 100);
    }

    #[test]
    fn sync_status_lists_failures() {
        let pool_id = PoolId::new();
        let outcome = Err(GatewayError::SyncFailed {
            failures: vec![PoolFailure {
                pool_id,
                message: "persistence error: down".to_string(),
            }],
        });
        let status = PoolSyncStatus::from(&outcome);
        assert!(!status.ok);
        assert_eq!(status.failures.len(), 1);
        assert!(PoolSyncStatus::from(&Ok(())).ok);
    }
}
