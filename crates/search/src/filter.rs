//! Declarative search requests.

use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::{FieldPath, MatchMode, Value};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One text filter. Filters sharing a `dimension` are alternatives (OR);
/// distinct dimensions must all hold (AND).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub dimension: String,
    pub field: FieldPath,
    pub mode: MatchMode,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub field: FieldPath,
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// At least one of the values (union).
    Any,
    /// Every value (intersection).
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipFilter {
    pub field: FieldPath,
    pub values: Vec<Value>,
    pub mode: Membership,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuery {
    pub text: String,
    pub fields: Vec<FieldPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: FieldPath,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into(), direction: SortDirection::Ascending }
    }

    pub fn descending(field: impl Into<FieldPath>) -> Self {
        Self { field: field.into(), direction: SortDirection::Descending }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_PAGE_SIZE }
    }
}

/// Everything a caller can ask of a search, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub query: Option<TextQuery>,
    pub filters: Vec<FieldFilter>,
    pub equals: Vec<(FieldPath, Value)>,
    pub ranges: Vec<RangeFilter>,
    pub memberships: Vec<MembershipFilter>,
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text query matched against alternative `fields`.
    pub fn query<I, F>(mut self, text: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldPath>,
    {
        self.query = Some(TextQuery {
            text: text.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn filter(
        mut self,
        dimension: impl Into<String>,
        field: impl Into<FieldPath>,
        mode: MatchMode,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(FieldFilter {
            dimension: dimension.into(),
            field: field.into(),
            mode,
            value: value.into(),
        });
        self
    }

    pub fn equals(mut self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    /// Inclusive range; `None` leaves that side open.
    pub fn range(
        mut self,
        field: impl Into<FieldPath>,
        lower: Option<Value>,
        upper: Option<Value>,
    ) -> Self {
        self.ranges.push(RangeFilter {
            field: field.into(),
            lower: lower.map_or(Bound::Unbounded, Bound::Included),
            upper: upper.map_or(Bound::Unbounded, Bound::Included),
        });
        self
    }

    /// Strictly after `value`.
    pub fn after(mut self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.ranges.push(RangeFilter {
            field: field.into(),
            lower: Bound::Excluded(value.into()),
            upper: Bound::Unbounded,
        });
        self
    }

    pub fn members(
        mut self,
        field: impl Into<FieldPath>,
        values: impl IntoIterator<Item = Value>,
        mode: Membership,
    ) -> Self {
        self.memberships.push(MembershipFilter {
            field: field.into(),
            values: values.into_iter().collect(),
            mode,
        });
        self
    }

    pub fn sort_by(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: usize, size: usize) -> Self {
        self.page = PageRequest { page, size };
        self
    }
}
