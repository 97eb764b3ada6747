//! Sort specifications and their URL encodings
//!
//! Admin tables carry a JSON-encoded array of `{id, desc}` pairs
//! (`sort=[{"id":"name","desc":false}]`); public listing pages use the compact
//! `field.dir` form (`sort=name.asc`). Either way, a parser built with a known
//! field set rejects any column outside that set.

use crate::core::param::DecodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

/// One `{id, desc}` entry of a sort specification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortColumn {
    /// Column (field) name
    pub id: String,

    /// Descending when true
    pub desc: bool,
}

impl SortColumn {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

/// Ordered sequence of sort columns.
///
/// Equality is element-wise on `(id, desc)`: two states are equal only if
/// they list the same columns in the same order with the same directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortingState(Vec<SortColumn>);

impl SortingState {
    pub fn new(columns: Vec<SortColumn>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[SortColumn] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_columns(self) -> Vec<SortColumn> {
        self.0
    }
}

impl From<Vec<SortColumn>> for SortingState {
    fn from(columns: Vec<SortColumn>) -> Self {
        Self(columns)
    }
}

/// Wire format of a sort parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortFormat {
    /// `[{"id":"name","desc":false}]`
    #[default]
    Json,

    /// `name.asc` or `name.asc,created_at.desc`
    Compact,
}

/// Decoder/encoder for sort parameters
#[derive(Debug, Clone, Default)]
pub struct SortingStateParser {
    format: SortFormat,
    known_fields: Option<Arc<BTreeSet<String>>>,
}

impl SortingStateParser {
    /// Parser accepting any column id
    pub fn new(format: SortFormat) -> Self {
        Self {
            format,
            known_fields: None,
        }
    }

    /// Parser rejecting column ids outside `fields`
    pub fn with_known_fields<I, S>(format: SortFormat, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format,
            known_fields: Some(Arc::new(fields.into_iter().map(Into::into).collect())),
        }
    }

    pub fn format(&self) -> SortFormat {
        self.format
    }

    /// Decode a raw parameter value.
    ///
    /// Fails on malformed input and on any column id outside the known set;
    /// a single unknown column rejects the whole value.
    pub fn try_decode(&self, raw: &str) -> Result<SortingState, DecodeError> {
        let columns = match self.format {
            SortFormat::Json => serde_json::from_str::<Vec<SortColumn>>(raw)
                .map_err(|e| DecodeError::Malformed(e.to_string()))?,
            SortFormat::Compact => Self::decode_compact(raw)?,
        };

        if let Some(known) = &self.known_fields {
            if let Some(unknown) = columns.iter().find(|c| !known.contains(&c.id)) {
                return Err(DecodeError::UnknownField(unknown.id.clone()));
            }
        }

        Ok(SortingState(columns))
    }

    /// Decode a raw parameter value, returning `None` when it is rejected
    pub fn decode(&self, raw: &str) -> Option<SortingState> {
        match self.try_decode(raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::debug!(raw = %raw, error = %e, "Rejected sort parameter");
                None
            }
        }
    }

    /// Whether a state could have come from this parser.
    ///
    /// Holds when its encoding decodes back to the same columns, which rules
    /// out unknown columns and, in the compact format, an empty sort.
    pub fn accepts(&self, state: &SortingState) -> bool {
        self.try_decode(&self.encode(state))
            .is_ok_and(|decoded| decoded == *state)
    }

    /// Encode a sorting state in this parser's wire format
    pub fn encode(&self, state: &SortingState) -> String {
        match self.format {
            SortFormat::Json => {
                serde_json::to_string(&state.0).unwrap_or_else(|_| "[]".to_string())
            }
            SortFormat::Compact => state
                .0
                .iter()
                .map(|c| format!("{}.{}", c.id, if c.desc { "desc" } else { "asc" }))
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn decode_compact(raw: &str) -> Result<Vec<SortColumn>, DecodeError> {
        static COMPACT_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = COMPACT_REGEX.get_or_init(|| {
            Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.(asc|desc)$").expect("valid sort regex")
        });

        raw.split(',')
            .map(|part| {
                let caps = regex
                    .captures(part.trim())
                    .ok_or_else(|| DecodeError::Malformed(format!("bad sort term '{}'", part)))?;
                Ok(SortColumn {
                    id: caps[1].to_string(),
                    desc: &caps[2] == "desc",
                })
            })
            .collect()
    }
}
