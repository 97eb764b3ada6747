//! Composable boolean expressions over entity fields

use crate::core::entity::Listable;
use crate::core::field::FieldValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Top-level operator joining user filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    /// Parse the URL form (`and` / `or`); anything else is `And`
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("or") => Combinator::Or,
            _ => Combinator::And,
        }
    }
}

/// Boolean expression tree evaluated against each candidate record
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match
    Contains { field: String, value: String },

    /// Case-insensitive prefix match
    StartsWith { field: String, value: String },

    /// Leading character is an ASCII digit
    StartsWithDigit { field: String },

    /// Exact match on the field's textual form
    Equals { field: String, value: FieldValue },

    /// Inclusive date range on a datetime field; either bound may be open
    DateRange {
        field: String,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },

    /// Every child holds (empty: true)
    All(Vec<Predicate>),

    /// At least one child holds (empty: false)
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Predicate::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Join expressions with a combinator; `None` when there is nothing to join
    pub fn combine(combinator: Combinator, mut parts: Vec<Predicate>) -> Option<Predicate> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(match combinator {
                Combinator::And => Predicate::All(parts),
                Combinator::Or => Predicate::Any(parts),
            }),
        }
    }

    /// Intersect an optional base predicate with optional filters.
    ///
    /// The base is never widened: the result holds only where the base holds.
    pub fn intersect(base: Option<Predicate>, filters: Option<Predicate>) -> Option<Predicate> {
        match (base, filters) {
            (Some(b), Some(f)) => Some(Predicate::All(vec![b, f])),
            (Some(b), None) => Some(b),
            (None, f) => f,
        }
    }

    /// Every field name referenced by this expression
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Contains { field, .. }
            | Predicate::StartsWith { field, .. }
            | Predicate::StartsWithDigit { field }
            | Predicate::Equals { field, .. }
            | Predicate::DateRange { field, .. } => out.push(field),
            Predicate::All(children) | Predicate::Any(children) => {
                children.iter().for_each(|c| c.collect_fields(out))
            }
        }
    }

    /// Evaluate against an entity; unknown fields never match
    pub fn evaluate<T: Listable>(&self, entity: &T) -> bool {
        match self {
            Predicate::Contains { field, value } => entity
                .field_value(field)
                .is_some_and(|fv| fv.contains_ignore_case(value)),
            Predicate::StartsWith { field, value } => entity
                .field_value(field)
                .is_some_and(|fv| fv.starts_with_ignore_case(value)),
            Predicate::StartsWithDigit { field } => entity.field_value(field).is_some_and(|fv| {
                fv.as_string()
                    .and_then(|s| s.chars().next())
                    .is_some_and(|c| c.is_ascii_digit())
            }),
            Predicate::Equals { field, value } => entity
                .field_value(field)
                .is_some_and(|fv| fv.matches(value)),
            Predicate::DateRange { field, from, to } => entity
                .field_value(field)
                .and_then(|fv| fv.as_date())
                .is_some_and(|d| from.is_none_or(|f| d >= f) && to.is_none_or(|t| d <= t)),
            Predicate::All(children) => children.iter().all(|c| c.evaluate(entity)),
            Predicate::Any(children) => children.iter().any(|c| c.evaluate(entity)),
        }
    }
}
