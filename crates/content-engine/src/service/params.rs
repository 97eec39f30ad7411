//! Query-shape parameters accepted by the entity service

use content_store::{QueryParams, SortOrder};
use serde_json::Value;

/// Default number of results per page when none is requested
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Hard cap on the requested page size
pub const MAX_PAGE_SIZE: u64 = 100;

/// Parse a sort clause in `"field"` or `"field:desc"` form. Unknown
/// directions fall back to ascending.
pub fn parse_sort(clause: &str) -> (String, SortOrder) {
    match clause.split_once(':') {
        Some((field, direction)) if direction.eq_ignore_ascii_case("desc") => {
            (field.to_string(), SortOrder::Desc)
        }
        Some((field, _)) => (field.to_string(), SortOrder::Asc),
        None => (clause.to_string(), SortOrder::Asc),
    }
}

/// Parameters for offset-based list queries
#[derive(Debug, Clone, Default)]
pub struct FindParams {
    pub filters: Option<Value>,
    pub sort: Vec<(String, SortOrder)>,
    pub start: Option<u64>,
    pub limit: Option<u64>,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Add a sort clause in `"field"` or `"field:desc"` string form
    pub fn sort_by(mut self, clause: &str) -> Self {
        self.sort.push(parse_sort(clause));
        self
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(filters) = &self.filters {
            query = query.filters(filters.clone());
        }
        for (field, order) in &self.sort {
            query = query.sort(field.clone(), *order);
        }
        if let Some(start) = self.start {
            query = query.offset(start);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

/// Parameters for page-based list queries
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    pub filters: Option<Value>,
    pub sort: Vec<(String, SortOrder)>,
    /// 1-based page number; values below 1 are clamped up
    pub page: Option<u64>,
    /// Requested page size, clamped to [1, 100]
    pub page_size: Option<u64>,
}

impl PageParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Add a sort clause in `"field"` or `"field:desc"` string form
    pub fn sort_by(mut self, clause: &str) -> Self {
        self.sort.push(parse_sort(clause));
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Resolve the effective `(page, page_size)` pair
    pub fn normalize(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }

    pub(crate) fn to_query(&self) -> QueryParams {
        let (page, page_size) = self.normalize();
        let mut query = QueryParams::new();
        if let Some(filters) = &self.filters {
            query = query.filters(filters.clone());
        }
        for (field, order) in &self.sort {
            query = query.sort(field.clone(), *order);
        }
        query.offset((page - 1) * page_size).limit(page_size)
    }
}

/// Pagination metadata returned alongside a page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub total: u64,
}

/// One page of results
#[derive(Debug, Clone)]
pub struct Page {
    pub results: Vec<Value>,
    pub pagination: Pagination,
}

/// Payload for create and update calls
#[derive(Debug, Clone, Default)]
pub struct WriteParams {
    /// Entity data to validate and persist
    pub data: Value,
    /// Optional per-attribute file map handed to the upload collaborator
    pub files: Option<Value>,
}

impl WriteParams {
    pub fn from_data(data: Value) -> Self {
        Self { data, files: None }
    }

    pub fn files(mut self, files: Value) -> Self {
        self.files = Some(files);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_normalization_defaults() {
        assert_eq!(PageParams::new().normalize(), (1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_page_normalization_clamps() {
        assert_eq!(PageParams::new().page(0).normalize().0, 1);
        assert_eq!(PageParams::new().page_size(0).normalize().1, 1);
        assert_eq!(PageParams::new().page_size(5000).normalize().1, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_query_offsets_from_one_based_pages() {
        let query = PageParams::new().page(3).page_size(25).to_query();
        assert_eq!(query.offset, Some(50));
        assert_eq!(query.limit, Some(25));
    }

    #[test]
    fn test_sort_clause_parsing() {
        assert_eq!(parse_sort("title"), ("title".to_string(), SortOrder::Asc));
        assert_eq!(
            parse_sort("createdAt:desc"),
            ("createdAt".to_string(), SortOrder::Desc)
        );
        assert_eq!(parse_sort("title:DESC").1, SortOrder::Desc);
        assert_eq!(parse_sort("title:bogus").1, SortOrder::Asc);
    }

    #[test]
    fn test_find_params_pass_through() {
        let query = FindParams::new()
            .filters(json!({"title": "x"}))
            .sort("title", SortOrder::Desc)
            .start(4)
            .limit(2)
            .to_query();
        assert_eq!(query.filters, Some(json!({"title": "x"})));
        assert_eq!(query.offset, Some(4));
        assert_eq!(query.limit, Some(2));
        assert_eq!(query.sort.len(), 1);
    }
}
