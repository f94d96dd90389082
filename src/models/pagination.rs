use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Items per page (default: 20, max: 100)
    #[schema(example = 20)]
    pub limit: Option<u64>,
    /// Items to skip (default: 0)
    #[schema(example = 0)]
    pub offset: Option<u64>,
}

/// Numeric limit/offset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        let limit = match limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit.min(MAX_LIMIT),
        };
        Page {
            limit,
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

impl From<&PageQuery> for Page {
    fn from(query: &PageQuery) -> Self {
        Page::new(query.limit, query.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_missing_limit_defaults_to_twenty() {
        assert_eq!(Page::new(None, None), Page { limit: 20, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(5)), Page { limit: 20, offset: 5 });
    }

    #[test]
    fn oversized_limit_is_clamped() {
        assert_eq!(Page::new(Some(10_000), None).limit, MAX_LIMIT);
        assert_eq!(Page::new(Some(7), None).limit, 7);
    }
}
