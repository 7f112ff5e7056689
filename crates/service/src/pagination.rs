//! Pagination utilities for service layer
//!
//! Offset/limit parameters with per-endpoint defaults and an upper bound.

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// rows to skip
    pub skip: u64,
    /// maximum rows returned
    pub limit: u64,
}

/// Default limit of the plain list endpoint.
pub const LIST_DEFAULT_LIMIT: u64 = 100;
/// Default limit of the paged endpoint.
pub const PAGE_DEFAULT_LIMIT: u64 = 50;

impl Pagination {
    /// Fill missing values with `default_limit` and a zero offset.
    pub fn from_query(skip: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self { skip: skip.unwrap_or(0), limit: limit.unwrap_or(default_limit) }
    }

    /// Clamp the limit to `max`.
    pub fn normalize(self, max: u64) -> Self {
        Self { skip: self.skip, limit: self.limit.min(max) }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { skip: 0, limit: LIST_DEFAULT_LIMIT } }
}
