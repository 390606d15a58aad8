//! List query parameters and the two list response shapes

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query-string filters accepted by every list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Page number (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Number of items per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Status filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Stage filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Free-text search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Endpoint-specific filters
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ListQuery {
    /// Empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one page
    #[must_use]
    pub const fn page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Filter by status
    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Filter by stage
    #[must_use]
    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Free-text search; blank terms are dropped
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.trim().to_string())
        };
        self
    }

    /// Any other filter
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// `(key, value)` pairs in query-string order
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        for (key, value) in [
            ("status", &self.status),
            ("stage", &self.stage),
            ("search", &self.search),
        ] {
            if let Some(value) = value {
                pairs.push((key.to_string(), value.clone()));
            }
        }
        pairs.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// Server pagination metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    /// Total matching items
    #[serde(deserialize_with = "crate::utils::lenient::u64")]
    pub total: u64,
    /// Total pages
    #[serde(alias = "total_pages", deserialize_with = "crate::utils::lenient::u64")]
    pub total_pages: u64,
}

/// List rows decoded one at a time.
///
/// A row that does not decode (an unknown stage, a missing required field) is
/// dropped and counted instead of failing the whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows<T> {
    /// Rows that decoded
    pub items: Vec<T>,
    /// Rows that did not
    pub skipped: usize,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Rows<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Value>::deserialize(deserializer)?;
        let received = raw.len();

        let items: Vec<T> = raw
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping list row");
                    None
                }
            })
            .collect();

        Ok(Self {
            skipped: received - items.len(),
            items,
        })
    }
}

/// A list endpoint answers with either a bare array or `{data, pagination}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, bound = "T: DeserializeOwned")]
pub enum ListResponse<T> {
    /// Bare array
    Bare(Rows<T>),
    /// Wrapped with pagination metadata
    Paged {
        /// Items of this page
        data: Rows<T>,
        /// Metadata, may be missing
        #[serde(default)]
        pagination: Option<PageInfo>,
    },
}

/// Normalized list result
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page
    pub items: Vec<T>,
    /// Total matching items across pages
    pub total: u64,
    /// Total pages, at least 1
    pub total_pages: u64,
    /// Rows of this page dropped because they did not decode
    pub skipped: usize,
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        let (rows, info) = match response {
            ListResponse::Bare(rows) => (rows, None),
            ListResponse::Paged { data, pagination } => (data, pagination),
        };
        let len = rows.items.len() as u64;
        let info = info.unwrap_or(PageInfo {
            total: len,
            total_pages: 1,
        });

        Self {
            items: rows.items,
            total: info.total.max(len),
            total_pages: info.total_pages.max(1),
            skipped: rows.skipped,
        }
    }
}

impl<T> Page<T> {
    /// Whether the page has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bare_array_normalizes() {
        let response: ListResponse<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
        let page = Page::from(response);

        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_paged_response_normalizes() {
        let response: ListResponse<u32> =
            serde_json::from_str(r#"{"data": [1, 2], "pagination": {"total": 42, "totalPages": 21}}"#)
                .unwrap();
        let page = Page::from(response);

        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.total, 42);
        assert_eq!(page.total_pages, 21);
    }

    #[test]
    fn test_paged_response_without_metadata() {
        let response: ListResponse<u32> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let page = Page::from(response);

        assert!(page.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_bad_rows_are_skipped_not_fatal() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Row {
            id: u32,
        }

        let response: ListResponse<Row> = serde_json::from_str(
            r#"{"data": [{"id": 1}, {"id": "x"}, {}, {"id": 4}], "pagination": {"total": 4}}"#,
        )
        .unwrap();
        let page = Page::from(response);

        assert_eq!(page.items, vec![Row { id: 1 }, Row { id: 4 }]);
        assert_eq!(page.skipped, 2);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn test_deal_list_survives_unknown_and_missing_stage() {
        let response: ListResponse<crate::types::Deal> = serde_json::from_str(
            r#"[{"id": 1, "stage": "New"}, {"id": 2, "stage": "Qualified"}, {"id": 3, "title": "A"}]"#,
        )
        .unwrap();
        let page = Page::from(response);

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id.as_str(), "1");
        assert_eq!(page.skipped, 2);
    }

    #[test]
    fn test_query_pairs() {
        let query = ListQuery::new()
            .page(2, 25)
            .status("open")
            .search("  acme ")
            .filter("ownerId", "7");

        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "25".to_string()),
                ("status".to_string(), "open".to_string()),
                ("search".to_string(), "acme".to_string()),
                ("ownerId".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_dropped() {
        assert!(ListQuery::new().search("   ").to_pairs().is_empty());
    }
}
