//! Listing request and response envelopes.
//!
//! Two idioms exist: offset pages (`PageRequest` -> `Page`) with search and
//! sort, and keyset cursors (`CursorQuery` -> `CursorPage`).

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;

/// Requested ordering. `direction` is `asc` or `desc`; anything else sorts ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SortSpec {
    pub field: String,
    #[serde(default, alias = "dir")]
    pub direction: Option<String>,
}

impl SortSpec {
    pub fn descending(&self) -> bool {
        self.direction
            .as_deref()
            .is_some_and(|direction| direction.eq_ignore_ascii_case("desc"))
    }
}

/// Body of every `*/search` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct PageRequest {
    /// 1-based page index, values below 1 are treated as 1
    pub page: Option<i64>,
    /// Rows per page, defaults to 20 and is clamped into [1, 200]
    pub page_size: Option<i64>,
    /// Case-insensitive substring matched against the endpoint's search columns
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
}

impl PageRequest {
    /// Returns the effective `(page, page_size)` pair.
    pub fn normalize(&self) -> (u64, u64) {
        let page = self.page.filter(|page| *page >= 1).unwrap_or(1) as u64;
        let page_size = self
            .page_size
            .map(|size| size.clamp(1, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        (page, page_size)
    }
}

/// Query-string form of [`PageRequest`] used by `GET` offset listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams, Validate, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    /// Field to sort on
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_dir: Option<String>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
            search: query.search,
            sort: query.sort_by.map(|field| SortSpec {
                field,
                direction: query.sort_dir,
            }),
        }
    }
}

/// One window of an offset listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole filtered set
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Query string of cursor listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams, Validate, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct CursorQuery {
    /// Only rows with a greater id are returned, defaults to 0
    pub last_seen_id: Option<i32>,
    /// Maximum rows returned, defaults to 20 and is clamped into [1, 200]
    pub limit: Option<i64>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

impl CursorQuery {
    pub fn normalize(&self) -> (i32, u64) {
        let last_seen_id = self.last_seen_id.unwrap_or(0).max(0);
        let limit = self
            .limit
            .map(|limit| limit.clamp(1, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        (last_seen_id, limit)
    }
}

/// One batch of a cursor listing. `next_cursor` is `None` once nothing was returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i32>,
}

impl<T> CursorPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults() {
        assert_eq!(PageRequest::default().normalize(), (1, 20));
        assert_eq!(CursorQuery::default().normalize(), (0, 20));
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let request = PageRequest {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(request.normalize(), (1, 200));

        let request = PageRequest {
            page: Some(-3),
            page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(request.normalize(), (1, 1));

        let query = CursorQuery {
            last_seen_id: Some(-5),
            limit: Some(0),
            search: None,
        };
        assert_eq!(query.normalize(), (0, 1));
    }

    #[test]
    fn sort_direction_accepts_dir_alias() {
        let spec: SortSpec = serde_json::from_str(r#"{"field": "name", "dir": "DESC"}"#).unwrap();
        assert!(spec.descending());

        let spec: SortSpec = serde_json::from_str(r#"{"field": "name", "direction": "up"}"#).unwrap();
        assert!(!spec.descending());

        let spec: SortSpec = serde_json::from_str(r#"{"field": "name"}"#).unwrap();
        assert!(!spec.descending());
    }

    #[test]
    fn page_request_fields_are_optional() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn page_query_builds_sort_only_with_field() {
        let query = PageQuery {
            page: Some(2),
            sort_by: Some("name".to_string()),
            sort_dir: Some("desc".to_string()),
            ..Default::default()
        };
        let request = PageRequest::from(query);
        assert_eq!(request.page, Some(2));
        assert!(request.sort.as_ref().is_some_and(SortSpec::descending));

        let request = PageRequest::from(PageQuery {
            sort_dir: Some("desc".to_string()),
            ..Default::default()
        });
        assert!(request.sort.is_none());
    }
}
