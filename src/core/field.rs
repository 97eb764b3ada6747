//! Field values exposed by listable entities

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),

    /// List-valued field (tags); equality means membership
    List(Vec<String>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Calendar date of a datetime value (UTC)
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    /// Get the items of a list value
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Textual form used for equality against URL parameters
    pub fn to_text(&self) -> Option<String> {
        match self {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Uuid(u) => Some(u.to_string()),
            FieldValue::DateTime(dt) => Some(dt.to_rfc3339()),
            FieldValue::List(items) => Some(items.join(",")),
            FieldValue::Null => None,
        }
    }

    /// Case-insensitive substring match; a list matches if any item does
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        match self {
            FieldValue::String(s) => s.to_lowercase().contains(&needle),
            FieldValue::List(items) => items.iter().any(|s| s.to_lowercase().contains(&needle)),
            _ => false,
        }
    }

    /// Exact equality against a filter value.
    ///
    /// Typed values compare directly or by their text form; list values match
    /// when one item equals the filter value.
    pub fn matches(&self, value: &FieldValue) -> bool {
        if self == value {
            return true;
        }
        match (self, value.to_text()) {
            (FieldValue::List(items), Some(wanted)) => items.iter().any(|item| *item == wanted),
            (FieldValue::Null, _) | (_, None) => false,
            (field, Some(wanted)) => field.to_text().is_some_and(|text| text == wanted),
        }
    }

    /// Case-insensitive prefix match
    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.as_string()
            .is_some_and(|s| s.to_lowercase().starts_with(&prefix.to_lowercase()))
    }

    /// Total ordering used when sorting listings.
    ///
    /// Nulls sort first. Values of different kinds compare by kind rank so the
    /// ordering stays total even for heterogeneous data.
    pub fn total_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
            }
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::List(a), FieldValue::List(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Boolean(_) => 1,
            FieldValue::Integer(_) | FieldValue::Float(_) => 2,
            FieldValue::String(_) => 3,
            FieldValue::Uuid(_) => 4,
            FieldValue::DateTime(_) => 5,
            FieldValue::List(_) => 6,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::String(value.clone())
    }
}

impl From<&i64> for FieldValue {
    fn from(value: &i64) -> Self {
        FieldValue::Integer(*value)
    }
}

impl From<&f64> for FieldValue {
    fn from(value: &f64) -> Self {
        FieldValue::Float(*value)
    }
}

impl From<&bool> for FieldValue {
    fn from(value: &bool) -> Self {
        FieldValue::Boolean(*value)
    }
}

impl From<&Uuid> for FieldValue {
    fn from(value: &Uuid) -> Self {
        FieldValue::Uuid(*value)
    }
}

impl From<&DateTime<Utc>> for FieldValue {
    fn from(value: &DateTime<Utc>) -> Self {
        FieldValue::DateTime(*value)
    }
}

impl From<&Vec<String>> for FieldValue {
    fn from(value: &Vec<String>) -> Self {
        FieldValue::List(value.clone())
    }
}

macro_rules! impl_from_option {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<&Option<$ty>> for FieldValue {
                fn from(value: &Option<$ty>) -> Self {
                    value.as_ref().map_or(FieldValue::Null, FieldValue::from)
                }
            }
        )*
    };
}

impl_from_option!(String, i64, f64, bool, Uuid, DateTime<Utc>);
