//! List query parameters.
//!
//! v4 list endpoints take OData-style parameters (`$filter`, `$orderby`,
//! `$select`, `$expand`, `$page`, `$limit`). [`ListQuery`] carries them and
//! [`QueryParams`] assembles the final pairs, skipping absent values.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Largest page size accepted by Prism Central
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: &str, value: Option<T>)
    where
        T: ToString,
    {
        if let Some(value) = value {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Parameters of a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// OData filter passed through verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Sort expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    /// Projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    /// Related entities to expand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    /// Zero-based page index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size (1-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Additional endpoint-specific parameters, sent without a `$` prefix
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl ListQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the sort expression.
    #[must_use]
    pub fn with_orderby(mut self, orderby: impl Into<String>) -> Self {
        self.orderby = Some(orderby.into());
        self
    }

    /// Set the projection.
    #[must_use]
    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// Set the expansion.
    #[must_use]
    pub fn with_expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    /// Set the page index.
    #[must_use]
    pub const fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Add an endpoint-specific parameter.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Query pairs in wire form. Limits above [`MAX_PAGE_LIMIT`] are clamped.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut params = QueryParams::new();
        params.push_opt("$page", self.page);
        params.push_opt("$limit", self.limit.map(|l| l.clamp(1, MAX_PAGE_LIMIT)));
        params.push_opt("$filter", self.filter.as_deref());
        params.push_opt("$orderby", self.orderby.as_deref());
        params.push_opt("$select", self.select.as_deref());
        params.push_opt("$expand", self.expand.as_deref());
        for (key, value) in &self.extra {
            params.push(key, value);
        }
        params.into_pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_opt_skips_none() {
        let mut params = QueryParams::new();
        params.push_opt("name", Option::<String>::None);
        assert!(params.is_empty());
    }

    #[test]
    fn list_query_pairs() {
        let query = ListQuery::new()
            .with_filter("name eq 'web-01'")
            .with_orderby("name")
            .with_page(2)
            .with_limit(50);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("$page".to_string(), "2".to_string()),
                ("$limit".to_string(), "50".to_string()),
                ("$filter".to_string(), "name eq 'web-01'".to_string()),
                ("$orderby".to_string(), "name".to_string()),
            ]
        );
    }

    #[test]
    fn list_query_absent_keys_omitted() {
        assert!(ListQuery::new().to_pairs().is_empty());
    }

    #[test]
    fn list_query_clamps_limit() {
        let pairs = ListQuery::new().with_limit(500).to_pairs();
        assert_eq!(pairs, vec![("$limit".to_string(), "100".to_string())]);
        let pairs = ListQuery::new().with_limit(0).to_pairs();
        assert_eq!(pairs, vec![("$limit".to_string(), "1".to_string())]);
    }

    #[test]
    fn list_query_extra_params() {
        let pairs = ListQuery::new()
            .with_select("extId,name")
            .with_expand("cluster")
            .with_extra("includeDeleted", "true")
            .to_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("includeDeleted".to_string(), "true".to_string()));
    }
}
