//! Filter parameter schema and URL state serializer
//!
//! A [`FilterSchema`] declares, per listable entity, the recognized query
//! parameters: name, kind and default. It converts between a raw query string
//! and a fully populated [`FilterState`]:
//!
//! ```text
//! ?q=alpha&page=2            parse        { q: "alpha", sort: <default>, page: 2, perPage: <default> }
//!                       ───────────────▶
//!                       ◀───────────────
//! q=alpha&page=2            serialize    (defaults omitted)
//! ```
//!
//! Decoding never fails: absent, malformed or rejected values fall back to the
//! declared default and unknown parameters are ignored.

use crate::core::error::{ConfigError, ListingResult};
use crate::core::query::{FilterPatch, FilterState};
use crate::core::sorting::{SortingState, SortingStateParser};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::HashMap;
use url::form_urlencoded;

/// Name of the pagination parameter reset by every filter change
pub const PAGE_PARAM: &str = "page";

/// Name of the page size parameter
pub const PER_PAGE_PARAM: &str = "perPage";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a raw parameter value was not accepted
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed value: {0}")]
    Malformed(String),

    #[error("value {value} outside [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("value '{0}' is not one of the allowed values")]
    NotAllowed(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),
}

/// Typed value of a single filter parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Date(Option<NaiveDate>),
    Sort(SortingState),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParamValue::Date(d) => *d,
            _ => None,
        }
    }

    pub fn as_sort(&self) -> Option<&SortingState> {
        match self {
            ParamValue::Sort(s) => Some(s),
            _ => None,
        }
    }
}

/// Semantic type of a parameter
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Free text (search query, facet slug)
    Text,

    /// Bounded integer (page, page size)
    Integer { min: i64, max: i64 },

    /// One of a closed set of strings
    Enum(Vec<String>),

    /// Calendar date, `YYYY-MM-DD`
    Date,

    /// Sort specification
    Sort(SortingStateParser),
}

impl ParamKind {
    /// Decode a raw (already URL-decoded) value
    pub fn decode(&self, raw: &str) -> Result<ParamValue, DecodeError> {
        match self {
            ParamKind::Text => Ok(ParamValue::Text(raw.to_string())),
            ParamKind::Integer { min, max } => {
                let value = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DecodeError::Malformed(e.to_string()))?;
                if value < *min || value > *max {
                    return Err(DecodeError::OutOfRange {
                        value,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(ParamValue::Integer(value))
            }
            ParamKind::Enum(values) => {
                if values.iter().any(|v| v == raw) {
                    Ok(ParamValue::Text(raw.to_string()))
                } else {
                    Err(DecodeError::NotAllowed(raw.to_string()))
                }
            }
            ParamKind::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map(|d| ParamValue::Date(Some(d)))
                .map_err(|e| DecodeError::Malformed(e.to_string())),
            ParamKind::Sort(parser) => parser.try_decode(raw).map(ParamValue::Sort),
        }
    }

    /// Encode a value; `None` means the value has no URL representation
    pub fn encode(&self, value: &ParamValue) -> Option<String> {
        match (self, value) {
            (ParamKind::Text | ParamKind::Enum(_), ParamValue::Text(s)) => Some(s.clone()),
            (ParamKind::Integer { .. }, ParamValue::Integer(i)) => Some(i.to_string()),
            (ParamKind::Date, ParamValue::Date(d)) => {
                d.map(|d| d.format(DATE_FORMAT).to_string())
            }
            (ParamKind::Sort(parser), ParamValue::Sort(s)) => Some(parser.encode(s)),
            _ => None,
        }
    }

    /// Whether a value is well-typed for this kind
    pub fn accepts(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamKind::Text, ParamValue::Text(_)) => true,
            (ParamKind::Integer { min, max }, ParamValue::Integer(i)) => i >= min && i <= max,
            (ParamKind::Enum(values), ParamValue::Text(s)) => values.contains(s),
            (ParamKind::Date, ParamValue::Date(_)) => true,
            (ParamKind::Sort(parser), ParamValue::Sort(s)) => parser.accepts(s),
            _ => false,
        }
    }

    /// Equality rule of this kind.
    ///
    /// Sort lists compare element-wise on `(id, desc)`; every other kind uses
    /// plain value equality.
    pub fn values_equal(&self, a: &ParamValue, b: &ParamValue) -> bool {
        match (self, a, b) {
            (ParamKind::Sort(_), ParamValue::Sort(x), ParamValue::Sort(y)) => {
                x.columns().len() == y.columns().len()
                    && x
                        .columns()
                        .iter()
                        .zip(y.columns())
                        .all(|(l, r)| l.id == r.id && l.desc == r.desc)
            }
            _ => a == b,
        }
    }
}

/// Declaration of one parameter
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamDef {
    /// Whether a value may be stored under this parameter.
    ///
    /// The default is always admitted, since it never reaches the query string.
    pub fn admits(&self, value: &ParamValue) -> bool {
        self.kind.values_equal(value, &self.default) || self.kind.accepts(value)
    }
}

/// Ordered set of parameters recognized by one listing
#[derive(Debug, Clone)]
pub struct FilterSchema {
    entity: String,
    params: IndexMap<String, ParamDef>,
}

impl FilterSchema {
    /// Start declaring a schema for an entity
    pub fn builder(entity: impl Into<String>) -> FilterSchemaBuilder {
        FilterSchemaBuilder {
            entity: entity.into(),
            params: IndexMap::new(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// State with every parameter at its default
    pub fn defaults(&self) -> FilterState {
        FilterState::from_map(
            self.params
                .iter()
                .map(|(name, def)| (name.clone(), def.default.clone()))
                .collect(),
        )
    }

    /// Parse a raw query string (with or without leading `?`)
    pub fn parse(&self, raw_query: &str) -> FilterState {
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);

        // First occurrence of a repeated key wins
        let mut raw: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(raw_query.as_bytes()) {
            raw.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }

        let values = self
            .params
            .iter()
            .map(|(name, def)| {
                let value = match raw.get(name) {
                    Some(raw_value) => match def.kind.decode(raw_value) {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::debug!(
                                entity = %self.entity,
                                param = %name,
                                error = %e,
                                "Falling back to default for undecodable parameter"
                            );
                            def.default.clone()
                        }
                    },
                    None => def.default.clone(),
                };
                (name.clone(), value)
            })
            .collect();

        FilterState::from_map(values)
    }

    /// Serialize a state to a query string (without `?`), omitting defaults
    pub fn serialize(&self, state: &FilterState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, def) in &self.params {
            let Some(value) = state.get(name) else {
                continue;
            };
            if def.kind.values_equal(value, &def.default) {
                continue;
            }
            if let Some(encoded) = def.kind.encode(value) {
                serializer.append_pair(name, &encoded);
            }
        }
        serializer.finish()
    }

    /// True iff every non-excluded parameter equals its default
    pub fn is_default(&self, state: &FilterState, exclude: &[&str]) -> bool {
        self.params
            .iter()
            .filter(|(name, _)| !exclude.contains(&name.as_str()))
            .all(|(name, def)| {
                state
                    .get(name)
                    .is_none_or(|value| def.kind.values_equal(value, &def.default))
            })
    }

    /// Apply a patch to a state, returning the new state.
    ///
    /// Unknown names and ill-typed values in the patch are ignored. The page
    /// parameter is always reset to its default: any filter change restarts
    /// pagination.
    pub fn apply_patch(&self, state: &FilterState, patch: &FilterPatch) -> FilterState {
        let mut next = state.clone();
        for (name, value) in patch.iter() {
            match self.params.get(name) {
                Some(def) if def.admits(value) => next.set(name, value.clone()),
                Some(_) => {
                    tracing::debug!(entity = %self.entity, param = %name, "Ignoring ill-typed filter update")
                }
                None => {
                    tracing::debug!(entity = %self.entity, param = %name, "Ignoring unknown filter update")
                }
            }
        }
        if let Some(def) = self.params.get(PAGE_PARAM) {
            next.set(PAGE_PARAM, def.default.clone());
        }
        next
    }
}

/// Fluent builder for [`FilterSchema`]
pub struct FilterSchemaBuilder {
    entity: String,
    params: IndexMap<String, ParamDef>,
}

impl FilterSchemaBuilder {
    /// Free-text parameter defaulting to the empty string
    pub fn text(self, name: &str) -> Self {
        self.param(name, ParamKind::Text, ParamValue::text(""))
    }

    /// Bounded integer parameter
    pub fn integer(self, name: &str, default: i64, min: i64, max: i64) -> Self {
        self.param(name, ParamKind::Integer { min, max }, ParamValue::Integer(default))
    }

    /// Closed-set parameter
    pub fn enumeration<I, S>(self, name: &str, values: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.param(name, ParamKind::Enum(values), ParamValue::text(default))
    }

    /// Optional date parameter (absent by default)
    pub fn date(self, name: &str) -> Self {
        self.param(name, ParamKind::Date, ParamValue::Date(None))
    }

    /// Sort parameter
    pub fn sort(self, name: &str, parser: SortingStateParser, default: SortingState) -> Self {
        self.param(name, ParamKind::Sort(parser), ParamValue::Sort(default))
    }

    /// Declare a parameter; a later declaration with the same name replaces it
    pub fn param(mut self, name: &str, kind: ParamKind, default: ParamValue) -> Self {
        self.params
            .insert(name.to_string(), ParamDef { kind, default });
        self
    }

    /// Validate defaults and build the schema
    pub fn build(self) -> ListingResult<FilterSchema> {
        for (name, def) in &self.params {
            let empty_sort = matches!(&def.default, ParamValue::Sort(s) if s.is_empty());
            if !(empty_sort || def.kind.accepts(&def.default)) {
                return Err(ConfigError::InvalidValue {
                    field: name.clone(),
                    value: format!("{:?}", def.default),
                    message: format!("default is not valid for {:?}", def.kind),
                }
                .into());
            }
        }

        Ok(FilterSchema {
            entity: self.entity,
            params: self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sorting::{SortColumn, SortFormat};

    fn admin_schema() -> FilterSchema {
        FilterSchema::builder("category")
            .text("name")
            .sort(
                "sort",
                SortingStateParser::with_known_fields(SortFormat::Json, ["name", "order"]),
                SortingState::new(vec![SortColumn::asc("order")]),
            )
            .integer(PAGE_PARAM, 1, 1, i64::MAX)
            .integer(PER_PAGE_PARAM, 25, 1, 100)
            .date("from")
            .date("to")
            .enumeration("operator", ["and", "or"], "and")
            .build()
            .expect("valid schema")
    }

    #[test]
    fn test_parse_missing_values_use_defaults() {
        let schema = admin_schema();
        let state = schema.parse("");
        assert_eq!(state, schema.defaults());
        assert!(schema.is_default(&state, &[]));
    }

    #[test]
    fn test_parse_accepts_leading_question_mark() {
        let schema = admin_schema();
        let state = schema.parse("?name=notion&page=3");
        assert_eq!(state.text("name"), Some("notion"));
        assert_eq!(state.integer(PAGE_PARAM), Some(3));
    }

    #[test]
    fn test_parse_malformed_values_fall_back() {
        let schema = admin_schema();
        let state =
            schema.parse("page=abc&perPage=1000&from=yesterday&operator=xor&sort=%5B%7Bbroken");
        assert_eq!(state, schema.defaults());
    }

    #[test]
    fn test_parse_ignores_unknown_params() {
        let schema = admin_schema();
        let state = schema.parse("utm_source=newsletter&name=x");
        assert_eq!(state.text("name"), Some("x"));
        assert!(state.get("utm_source").is_none());
    }

    #[test]
    fn test_parse_first_duplicate_wins() {
        let schema = admin_schema();
        let state = schema.parse("name=first&name=second");
        assert_eq!(state.text("name"), Some("first"));
    }

    #[test]
    fn test_serialize_omits_defaults() {
        let schema = admin_schema();
        assert_eq!(schema.serialize(&schema.defaults()), "");

        let state = schema.parse("name=a%20b&operator=or&page=1");
        assert_eq!(schema.serialize(&state), "name=a+b&operator=or");
    }

    #[test]
    fn test_unknown_sort_column_falls_back_to_default() {
        let schema = admin_schema();
        let state = schema.parse(r#"sort=[{"id":"secretField","desc":true}]"#);
        assert_eq!(
            state.sort("sort").map(|s| s.columns().to_vec()),
            Some(vec![SortColumn::asc("order")])
        );
    }

    #[test]
    fn test_is_default_with_exclusions() {
        let schema = admin_schema();
        let state = schema.parse("page=4");
        assert!(!schema.is_default(&state, &[]));
        assert!(schema.is_default(&state, &[PAGE_PARAM]));
    }

    #[test]
    fn test_apply_patch_resets_page() {
        let schema = admin_schema();
        let state = schema.parse("page=7");
        let next = schema.apply_patch(&state, &FilterPatch::new().set("name", ParamValue::text("x")));
        assert_eq!(next.integer(PAGE_PARAM), Some(1));
        assert_eq!(next.text("name"), Some("x"));
    }

    #[test]
    fn test_apply_patch_ignores_ill_typed_and_unknown() {
        let schema = admin_schema();
        let state = schema.defaults();
        let patch = FilterPatch::new()
            .set("operator", ParamValue::text("xor"))
            .set("perPage", ParamValue::text("10"))
            .set("nope", ParamValue::text("1"));
        assert_eq!(schema.apply_patch(&state, &patch), state);
    }

    #[test]
    fn test_apply_patch_ignores_unknown_sort_column() {
        let schema = admin_schema();
        let state = schema.parse("name=x");
        let patch = FilterPatch::new().set(
            "sort",
            ParamValue::Sort(SortingState::new(vec![SortColumn::desc("secretField")])),
        );
        let next = schema.apply_patch(&state, &patch);
        assert_eq!(next, state);
        assert_eq!(schema.serialize(&next), "name=x");
    }

    #[test]
    fn test_apply_patch_compact_sort_must_round_trip() {
        let schema = FilterSchema::builder("tool")
            .sort(
                "sort",
                SortingStateParser::with_known_fields(SortFormat::Compact, ["name"]),
                SortingState::new(vec![SortColumn::asc("name")]),
            )
            .build()
            .expect("valid schema");
        let state = schema.defaults();

        let empty = FilterPatch::new().set("sort", ParamValue::Sort(SortingState::default()));
        assert_eq!(schema.apply_patch(&state, &empty), state);

        let desc = FilterPatch::new().set(
            "sort",
            ParamValue::Sort(SortingState::new(vec![SortColumn::desc("name")])),
        );
        let next = schema.apply_patch(&state, &desc);
        assert_eq!(schema.parse(&schema.serialize(&next)), next);
    }

    #[test]
    fn test_build_admits_empty_compact_default() {
        let schema = FilterSchema::builder("tag")
            .sort(
                "sort",
                SortingStateParser::with_known_fields(SortFormat::Compact, ["name"]),
                SortingState::default(),
            )
            .build();
        assert!(schema.is_ok());

        let unknown = FilterSchema::builder("tag")
            .sort(
                "sort",
                SortingStateParser::with_known_fields(SortFormat::Compact, ["name"]),
                SortingState::new(vec![SortColumn::asc("secretField")]),
            )
            .build();
        assert!(unknown.is_err());
    }

    #[test]
    fn test_build_rejects_invalid_default() {
        let result = FilterSchema::builder("tool")
            .enumeration("operator", ["and", "or"], "xor")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_non_default_state() {
        let schema = admin_schema();
        let state = schema.parse(
            "name=%C3%A9t%C3%A9&page=2&perPage=10&from=2024-01-01&to=2024-02-01&operator=or&sort=%5B%7B%22id%22%3A%22name%22%2C%22desc%22%3Atrue%7D%5D",
        );
        assert!(!schema.is_default(&state, &[]));
        assert_eq!(schema.parse(&schema.serialize(&state)), state);
    }
}
