//! Request bodies for the `list` and `count` record endpoints.
//!
//! The transport that sends these is outside this crate; the types here only
//! fix the body shape. Bodies use PascalCase keys, and an absent filter is
//! left out of the body entirely rather than sent as `null`.

use serde::{Deserialize, Serialize};

use crate::filter::{Filter, FilterTree};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Body of a `list` request.
///
/// # Examples
///
/// ```
/// use recordkit_query::request::{ListRequest, SortField};
/// use serde_json::json;
///
/// let request = ListRequest::new()
///     .with_fields(["name", "amount"])
///     .with_sort(SortField::desc("amount"))
///     .with_page(1, 50);
///
/// assert_eq!(
///     serde_json::to_value(&request).unwrap(),
///     json!({
///         "Fields": ["name", "amount"],
///         "Sort": [{ "Field": "amount", "Order": "Desc" }],
///         "PageNumber": 1,
///         "PageSize": 50
///     })
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRequest {
    /// Fields to return. Empty means the server default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,

    /// One-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_page(mut self, page_number: u32, page_size: u32) -> Self {
        self.page_number = Some(page_number);
        self.page_size = Some(page_size);
        self
    }
}

/// Body of a `count` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CountRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

impl CountRequest {
    pub fn new(filter: Option<Filter>) -> Self {
        Self { filter }
    }
}

impl FilterTree {
    /// A `list` request carrying this tree's payload and nothing else.
    pub fn to_list_request(&self) -> ListRequest {
        ListRequest::new().with_filter(self.payload())
    }

    /// A `count` request carrying this tree's payload.
    pub fn to_count_request(&self) -> CountRequest {
        CountRequest::new(self.payload())
    }
}
