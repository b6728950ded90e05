//! Validation and compilation of [`FilterSpec`]s, plus the reference
//! evaluator used by in-memory gateways.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use serde::Serialize;
use tradepost_core::{DomainError, DomainResult};

use crate::filter::{FieldFilter, Membership, PageRequest, SortDirection, SortSpec};
use crate::query::query_predicate;
use crate::{EntityKind, FieldDef, FieldPath, FilterSpec, MatchMode, Predicate, Searchable, Value, ValueKind};

/// A validated query: what the persistence gateway executes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub kind: EntityKind,
    pub predicate: Predicate,
    /// Primary sort; rows are always finally ordered by ascending id.
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub size: usize,
    /// Matching rows across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.size == 0 { 0 } else { self.total.div_ceil(self.size) }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}

fn lookup(kind: EntityKind, path: &FieldPath) -> DomainResult<&'static FieldDef> {
    kind.field(path.as_str()).ok_or_else(|| {
        DomainError::validation(format!("{kind} has no searchable field '{path}'"))
    })
}

fn expect_kind(kind: EntityKind, path: &FieldPath, expected: ValueKind) -> DomainResult<()> {
    let def = lookup(kind, path)?;
    if def.kind != expected {
        return Err(DomainError::validation(format!(
            "{kind}.{path} holds {:?} values, got {expected:?}",
            def.kind
        )));
    }
    Ok(())
}

fn bound_value(bound: &Bound<Value>) -> Option<&Value> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// Text filters of one dimension, OR-ed. Contains wins over exact when both
/// are requested for the same field and value; blank values are dropped.
fn dimension_predicate(filters: &[&FieldFilter]) -> Predicate {
    let mut leaves: BTreeMap<(FieldPath, String), MatchMode> = BTreeMap::new();
    for f in filters {
        let value = f.value.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        leaves
            .entry((f.field.clone(), value))
            .and_modify(|mode| {
                if f.mode == MatchMode::Contains {
                    *mode = MatchMode::Contains;
                }
            })
            .or_insert(f.mode);
    }
    Predicate::any_of(
        leaves
            .into_iter()
            .map(|((field, value), mode)| Predicate::text(field, mode, &value)),
    )
}

/// Validate `spec` against the field catalog of `kind` and build the query.
pub fn compile(kind: EntityKind, spec: &FilterSpec) -> DomainResult<CompiledQuery> {
    if spec.page.size == 0 {
        return Err(DomainError::validation("page size must be positive"));
    }

    let mut parts = Vec::new();

    if let Some(query) = &spec.query {
        if query.fields.is_empty() {
            return Err(DomainError::validation("a text query needs at least one field"));
        }
        for field in &query.fields {
            expect_kind(kind, field, ValueKind::Text)?;
        }
        parts.push(query_predicate(&query.text, &query.fields));
    }

    let mut dimensions: Vec<(&str, Vec<&FieldFilter>)> = Vec::new();
    for filter in &spec.filters {
        expect_kind(kind, &filter.field, ValueKind::Text)?;
        match dimensions.iter_mut().find(|(d, _)| *d == filter.dimension) {
            Some((_, group)) => group.push(filter),
            None => dimensions.push((filter.dimension.as_str(), vec![filter])),
        }
    }
    parts.extend(dimensions.iter().map(|(_, group)| dimension_predicate(group)));

    for (field, value) in &spec.equals {
        expect_kind(kind, field, value.kind())?;
        parts.push(Predicate::equals(field.clone(), value.clone()));
    }

    for range in &spec.ranges {
        let def = lookup(kind, &range.field)?;
        if !matches!(def.kind, ValueKind::Integer | ValueKind::Timestamp | ValueKind::Date) {
            return Err(DomainError::validation(format!(
                "{kind}.{} is not a numeric or date field",
                range.field
            )));
        }
        let lower = bound_value(&range.lower);
        let upper = bound_value(&range.upper);
        for bound in lower.iter().chain(upper.iter()) {
            if bound.kind() != def.kind {
                return Err(DomainError::validation(format!(
                    "range bound for {kind}.{} must be {:?}",
                    range.field, def.kind
                )));
            }
        }
        if let (Some(lo), Some(hi)) = (lower, upper) {
            if lo.compare(hi) == Some(Ordering::Greater) {
                return Err(DomainError::validation(format!(
                    "range for {kind}.{} has its lower bound above its upper bound",
                    range.field
                )));
            }
        }
        parts.push(Predicate::Range {
            field: range.field.clone(),
            lower: range.lower.clone(),
            upper: range.upper.clone(),
        });
    }

    for membership in &spec.memberships {
        let def = lookup(kind, &membership.field)?;
        if membership.mode == Membership::All && !def.collection && membership.values.len() > 1 {
            return Err(DomainError::validation(format!(
                "{kind}.{} holds a single value; it cannot contain all of several values",
                membership.field
            )));
        }
        if let Some(bad) = membership.values.iter().find(|v| v.kind() != def.kind) {
            return Err(DomainError::validation(format!(
                "{kind}.{} holds {:?} values, got {:?}",
                membership.field,
                def.kind,
                bad.kind()
            )));
        }
        let leaves = membership
            .values
            .iter()
            .map(|v| Predicate::equals(membership.field.clone(), v.clone()));
        parts.push(match membership.mode {
            Membership::Any => Predicate::any_of(leaves),
            Membership::All => Predicate::all_of(leaves),
        });
    }

    if let Some(sort) = &spec.sort {
        lookup(kind, &sort.field)?;
    }

    let predicate = Predicate::all_of(parts);
    tracing::debug!(%kind, ?predicate, "compiled search");

    Ok(CompiledQuery {
        kind,
        predicate,
        sort: spec.sort.clone(),
        page: spec.page,
    })
}

impl CompiledQuery {
    /// Order two rows: primary sort (missing values last), then ascending id.
    pub fn compare<S: Searchable + ?Sized>(&self, a: &S, b: &S) -> Ordering {
        let primary = match &self.sort {
            Some(sort) => {
                let av = a.field_values(&sort.field).into_iter().next();
                let bv = b.field_values(&sort.field).into_iter().next();
                match (av, bv) {
                    (Some(av), Some(bv)) => {
                        let ord = av.compare(&bv).unwrap_or(Ordering::Equal);
                        match sort.direction {
                            SortDirection::Ascending => ord,
                            SortDirection::Descending => ord.reverse(),
                        }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            None => Ordering::Equal,
        };
        primary.then_with(|| {
            a.sort_id()
                .compare(&b.sort_id())
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Evaluate over an in-memory row set.
    pub fn apply<S: Searchable>(&self, rows: impl IntoIterator<Item = S>) -> Page<S> {
        let mut hits: Vec<S> = rows
            .into_iter()
            .filter(|row| self.predicate.matches(row))
            .collect();
        hits.sort_by(|a, b| self.compare(a, b));

        let total = hits.len();
        let start = self.page.page.saturating_mul(self.page.size);
        let items = hits.into_iter().skip(start).take(self.page.size).collect();

        Page {
            items,
            page: self.page.page,
            size: self.page.size,
            total,
        }
    }
}
