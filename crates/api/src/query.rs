//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?page=&limit=`).
///
/// Values are clamped in the data layer via `clamp_page` / `clamp_limit`.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Resolve to a clamped `(page, limit, offset)` triple.
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = leukoscan_db::clamp_page(self.page);
        let limit = leukoscan_db::clamp_limit(self.limit);
        (page, limit, (page - 1) * limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_computes_offset() {
        let params = PageParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.resolve(), (3, 20, 40));
    }

    #[test]
    fn resolve_defaults() {
        let params = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(params.resolve(), (1, 10, 0));
    }
}
