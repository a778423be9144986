//! Shared response envelope types for API handlers.
//!
//! Plain payloads use the `{ "data": ... }` envelope; paginated listings use
//! `{ "items": [...], "pagination": {...} }`. Use these instead of ad-hoc
//! `serde_json::json!` blocks to get compile-time type safety and consistent
//! serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Pagination block attached to every paginated listing.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

/// Standard `{ "items": [...], "pagination": {...} }` envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T: Serialize> Paginated<T> {
    /// Assemble a page from its items and counts.
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            pagination: PageInfo {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}
