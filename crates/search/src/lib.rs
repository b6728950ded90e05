//! Storage-agnostic search.
//!
//! A [`FilterSpec`] is validated against the field catalog of an
//! [`EntityKind`] and compiled into a [`CompiledQuery`]: an AND/OR
//! [`Predicate`] tree over field leaves, a sort order and a page. A gateway
//! either evaluates the query directly over [`Searchable`] rows or translates
//! the tree into its native query language. Nothing here performs IO.

pub mod catalog;
pub mod compile;
pub mod filter;
pub mod predicate;
pub mod query;
pub mod value;

pub use catalog::{EntityKind, FieldDef};
pub use compile::{CompiledQuery, Page, compile};
pub use filter::{
    FieldFilter, FilterSpec, Membership, PageRequest, SortDirection, SortSpec,
    DEFAULT_PAGE_SIZE,
};
pub use predicate::{FieldPath, MatchMode, Predicate, Searchable};
pub use query::{Term, parse_query, query_predicate};
pub use value::{Value, ValueKind};
