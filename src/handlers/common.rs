use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{config::AppConfig, errors::ServiceError, services::total_pages, PaginatedResponse};

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Highest page a list endpoint will seek to
pub const MAX_PAGE: u64 = 1_000_000;

/// Pagination parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, capped by `api_max_page_size`
    pub limit: Option<u64>,
}

impl PageParams {
    /// `(page, limit)` after defaults and clamping
    pub fn resolve(&self, config: &AppConfig) -> (u64, u64) {
        (
            self.page.unwrap_or(1).clamp(1, MAX_PAGE),
            config.page_size(self.limit),
        )
    }
}

pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}

/// Treats blank optional query strings as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_counts_pages() {
        let page = paginated(vec![1, 2, 3], 45, 2, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 3);
    }

    #[test]
    fn huge_page_numbers_are_capped() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "page_params_test_secret_with_enough_length".into(),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        let params = PageParams {
            page: Some(u64::MAX),
            limit: Some(u64::MAX),
        };
        let (page, limit) = params.resolve(&cfg);
        assert_eq!(page, MAX_PAGE);
        assert_eq!(limit, cfg.api_max_page_size);
        assert_eq!(PageParams::default().resolve(&cfg).0, 1);
    }

    #[test]
    fn blank_filters_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some("Open".into())), Some("Open".into()));
    }
}
