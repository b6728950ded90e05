//! Predicate expression tree and its reference evaluator.

use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Dotted path to a (possibly related) field, e.g. `business.address.country`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Contains,
}

/// A row the reference evaluator can inspect.
///
/// Relations are flattened by the implementor: a sale listing answers
/// `business.address.country` itself. Missing or null fields return an empty
/// vector; collections return one value per member.
pub trait Searchable {
    fn field_values(&self, path: &FieldPath) -> Vec<Value>;

    /// Unique, stable key used as the final sort tie-break.
    fn sort_id(&self) -> Value;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches every row.
    All,
    /// Case-insensitive text match. `value` is stored lower-cased.
    Text {
        field: FieldPath,
        mode: MatchMode,
        value: String,
    },
    /// Some value of `field` equals `value`.
    Equals { field: FieldPath, value: Value },
    /// Some value of `field` falls within the bounds.
    Range {
        field: FieldPath,
        lower: Bound<Value>,
        upper: Bound<Value>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn text(field: impl Into<FieldPath>, mode: MatchMode, value: &str) -> Self {
        Predicate::Text {
            field: field.into(),
            mode,
            value: value.to_lowercase(),
        }
    }

    pub fn equals(field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction. `All` operands are dropped and nested conjunctions flattened.
    pub fn all_of(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Predicate::All => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.remove(0),
            _ => Predicate::And(flat),
        }
    }

    /// Disjunction. Any `All` operand makes the whole disjunction `All`; an
    /// empty set of alternatives places no constraint.
    pub fn any_of(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Predicate::All => return Predicate::All,
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.remove(0),
            _ => Predicate::Or(flat),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::all_of([self, other])
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::any_of([self, other])
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    pub fn matches<S: Searchable + ?Sized>(&self, row: &S) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Text { field, mode, value } => {
                row.field_values(field).iter().any(|v| match v.as_text() {
                    Some(text) => {
                        let text = text.to_lowercase();
                        match mode {
                            MatchMode::Exact => text == *value,
                            MatchMode::Contains => text.contains(value.as_str()),
                        }
                    }
                    None => false,
                })
            }
            Predicate::Equals { field, value } => {
                row.field_values(field).iter().any(|v| v.matches(value))
            }
            Predicate::Range { field, lower, upper } => row
                .field_values(field)
                .iter()
                .any(|v| within(v, lower, upper)),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(row)),
        }
    }
}

fn within(value: &Value, lower: &Bound<Value>, upper: &Bound<Value>) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let above = match lower {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(value.compare(b), Some(Greater | Equal)),
        Bound::Excluded(b) => matches!(value.compare(b), Some(Greater)),
    };
    let below = match upper {
        Bound::Unbounded => true,
        Bound::Included(b) => matches!(value.compare(b), Some(Less | Equal)),
        Bound::Excluded(b) => matches!(value.compare(b), Some(Less)),
    };
    above && below
}
