//! Configuration loading and management
//!
//! A [`ListingConfig`] describes, per entity, which parameters a listing
//! accepts and how they map onto entity fields:
//!
//! ```yaml
//! debounce_ms: 250
//! entities:
//!   - entity: tools
//!     per_page: 24
//!     search_fields: [name, tagline]
//!     facets:
//!       - param: category
//!         values: [ai, design, dev]
//!       - param: tag
//!         field: tags
//!     letter_field: name
//!     sort_format: compact
//!     default_sort: [{ id: name, desc: false }]
//!     sortable_fields: [name, created_at, published_at]
//!     submitter_field: submitter_id
//! ```

use crate::core::error::{ConfigError, ListingResult};
use crate::core::param::{FilterSchema, PAGE_PARAM, PER_PAGE_PARAM};
use crate::core::search::{DateRangeBinding, FieldBinding, SearchSpec};
use crate::core::sorting::{SortColumn, SortFormat, SortingState, SortingStateParser};
use crate::core::Listable;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default delay before a filter change is written to the URL
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

const DEFAULT_PER_PAGE: usize = 24;
const DEFAULT_MAX_PER_PAGE: usize = 100;

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

fn default_max_per_page() -> usize {
    DEFAULT_MAX_PER_PAGE
}

fn default_query_param() -> String {
    "q".to_string()
}

fn default_sort_param() -> String {
    "sort".to_string()
}

fn default_search_fields() -> Vec<String> {
    vec!["name".to_string()]
}

fn default_sort_format() -> SortFormat {
    SortFormat::Compact
}

fn default_sort() -> Vec<SortColumn> {
    vec![SortColumn::asc("name")]
}

fn default_sortable_fields() -> Vec<String> {
    vec!["name".to_string(), "created_at".to_string()]
}

/// Exact-match facet: URL parameter bound to an entity field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FacetConfig {
    #[validate(length(min = 1))]
    pub param: String,

    /// Entity field, defaults to the parameter name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Choices offered in the facet select; free text when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl FacetConfig {
    pub fn new(param: &str) -> Self {
        Self {
            param: param.to_string(),
            field: None,
            values: Vec::new(),
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn field(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.param)
    }
}

/// Listing configuration for one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_page_sizes"))]
pub struct EntityListingConfig {
    /// Plural resource name (e.g., "tools", "categories")
    #[validate(length(min = 1))]
    pub entity: String,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1))]
    pub per_page: usize,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,

    #[serde(default = "default_query_param")]
    pub query_param: String,

    /// Fields matched by the free-text parameter
    #[serde(default = "default_search_fields")]
    #[validate(length(min = 1))]
    pub search_fields: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub facets: Vec<FacetConfig>,

    /// Field filtered by the `letter` parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_field: Option<String>,

    /// Datetime field filtered by the `from`/`to` parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,

    /// Accept `operator=and|or`
    #[serde(default)]
    pub operator: bool,

    #[serde(default = "default_sort_param")]
    pub sort_param: String,

    #[serde(default = "default_sort_format")]
    pub sort_format: SortFormat,

    /// Order when no sort is requested
    #[serde(default = "default_sort")]
    pub default_sort: Vec<SortColumn>,

    /// Columns a sort parameter may name
    #[serde(default = "default_sortable_fields")]
    pub sortable_fields: Vec<String>,

    /// Field holding the owning user, enables the dashboard listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_field: Option<String>,
}

fn validate_page_sizes(config: &EntityListingConfig) -> Result<(), ValidationError> {
    if config.per_page > config.max_per_page {
        let mut err = ValidationError::new("per_page_above_max");
        err.message = Some("per_page must not exceed max_per_page".into());
        return Err(err);
    }
    Ok(())
}

impl EntityListingConfig {
    /// Minimal configuration: search by name, sort by name
    pub fn new(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            query_param: default_query_param(),
            search_fields: default_search_fields(),
            facets: Vec::new(),
            letter_field: None,
            date_field: None,
            operator: false,
            sort_param: default_sort_param(),
            sort_format: default_sort_format(),
            default_sort: default_sort(),
            sortable_fields: default_sortable_fields(),
            submitter_field: None,
        }
    }

    /// Every entity field this configuration refers to
    fn referenced_fields(&self) -> impl Iterator<Item = &str> {
        self.search_fields
            .iter()
            .map(String::as_str)
            .chain(self.facets.iter().map(FacetConfig::field))
            .chain(self.letter_field.as_deref())
            .chain(self.date_field.as_deref())
            .chain(self.sortable_fields.iter().map(String::as_str))
            .chain(self.default_sort.iter().map(|c| c.id.as_str()))
            .chain(self.submitter_field.as_deref())
    }

    /// Check that every referenced field exists on `T`
    pub fn check_fields<T: Listable>(&self) -> ListingResult<()> {
        if let Some(field) = self.referenced_fields().find(|f| !T::has_field(f)) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.fields", self.entity),
                value: field.to_string(),
                message: format!("'{}' is not a field of {}", field, T::resource_name()),
            }
            .into());
        }
        Ok(())
    }

    /// Parameter schema of this listing
    pub fn schema(&self) -> ListingResult<FilterSchema> {
        let mut builder = FilterSchema::builder(&self.entity).text(&self.query_param);

        for facet in &self.facets {
            builder = builder.text(&facet.param);
        }
        if self.letter_field.is_some() {
            builder = builder.text("letter");
        }
        if self.date_field.is_some() {
            builder = builder.date("from").date("to");
        }
        if self.operator {
            builder = builder.enumeration("operator", ["and", "or"], "and");
        }

        let parser = SortingStateParser::with_known_fields(
            self.sort_format,
            self.sortable_fields.iter().cloned(),
        );

        builder
            .sort(
                &self.sort_param,
                parser,
                SortingState::new(self.default_sort.clone()),
            )
            .integer(PAGE_PARAM, 1, 1, i64::MAX)
            .integer(
                PER_PAGE_PARAM,
                i64::try_from(self.per_page).unwrap_or(i64::MAX),
                1,
                i64::try_from(self.max_per_page).unwrap_or(i64::MAX),
            )
            .build()
    }

    /// Mapping from parameters to entity fields
    pub fn search_spec(&self) -> SearchSpec {
        SearchSpec {
            query_param: self.query_param.clone(),
            text_fields: self.search_fields.clone(),
            facets: self
                .facets
                .iter()
                .map(|f| FieldBinding::new(f.param.as_str(), f.field()))
                .collect(),
            letter: self
                .letter_field
                .as_deref()
                .map(|field| FieldBinding::new("letter", field)),
            date_range: self.date_field.as_ref().map(|field| DateRangeBinding {
                field: field.clone(),
                from_param: "from".to_string(),
                to_param: "to".to_string(),
            }),
            operator_param: self.operator.then(|| "operator".to_string()),
            sort_param: self.sort_param.clone(),
            default_order: self.default_sort.clone(),
            per_page: self.per_page,
            ..SearchSpec::new()
        }
    }
}

/// Listing configuration of a whole site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ListingConfig {
    /// Delay before a filter change is written to the URL
    #[serde(default = "default_debounce_ms")]
    #[validate(range(max = 10_000))]
    pub debounce_ms: u64,

    #[validate(nested)]
    pub entities: Vec<EntityListingConfig>,
}

impl ListingConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> ListingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        config.checked()
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ListingResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.checked()
    }

    fn checked(self) -> ListingResult<Self> {
        self.validate().map_err(|e| ConfigError::InvalidValue {
            field: "listing".to_string(),
            value: String::new(),
            message: e.to_string(),
        })?;
        Ok(self)
    }

    /// Configuration of one entity, by plural name
    pub fn entity(&self, plural: &str) -> ListingResult<&EntityListingConfig> {
        self.entities
            .iter()
            .find(|e| e.entity == plural)
            .ok_or_else(|| {
                ConfigError::UnknownEntity {
                    entity: plural.to_string(),
                }
                .into()
            })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Merge several configurations.
    ///
    /// Entities keep their first-seen order; a later configuration for the
    /// same entity replaces the earlier one. The last debounce wins.
    pub fn merge(configs: Vec<ListingConfig>) -> Self {
        let mut merged = ListingConfig {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            entities: Vec::new(),
        };

        for config in configs {
            merged.debounce_ms = config.debounce_ms;
            for entity in config.entities {
                match merged.entities.iter_mut().find(|e| e.entity == entity.entity) {
                    Some(existing) => *existing = entity,
                    None => merged.entities.push(entity),
                }
            }
        }

        merged
    }

    /// Configuration of the tools directory listings
    pub fn default_config() -> Self {
        let tools = EntityListingConfig {
            search_fields: vec!["name".to_string(), "tagline".to_string()],
            facets: vec![
                FacetConfig::new("category").with_values(["ai", "design", "dev", "productivity"]),
                FacetConfig {
                    field: Some("tags".to_string()),
                    ..FacetConfig::new("tag")
                },
                FacetConfig::new("country").with_values(["DE", "FR", "GB", "US"]),
            ],
            letter_field: Some("name".to_string()),
            date_field: Some("published_at".to_string()),
            operator: true,
            sortable_fields: vec![
                "name".to_string(),
                "created_at".to_string(),
                "published_at".to_string(),
            ],
            submitter_field: Some("submitter_id".to_string()),
            ..EntityListingConfig::new("tools")
        };

        let categories = EntityListingConfig {
            sort_format: SortFormat::Json,
            default_sort: vec![SortColumn::asc("order")],
            sortable_fields: vec![
                "name".to_string(),
                "order".to_string(),
                "created_at".to_string(),
            ],
            per_page: 25,
            date_field: Some("created_at".to_string()),
            operator: true,
            ..EntityListingConfig::new("categories")
        };

        let tags = EntityListingConfig {
            letter_field: Some("name".to_string()),
            ..EntityListingConfig::new("tags")
        };

        let locations = EntityListingConfig {
            facets: vec![FacetConfig::new("country")],
            ..EntityListingConfig::new("locations")
        };

        let shops = EntityListingConfig {
            facets: vec![FacetConfig::new("country"), FacetConfig::new("city")],
            letter_field: Some("name".to_string()),
            ..EntityListingConfig::new("shops")
        };

        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            entities: vec![tools, categories, tags, locations, shops],
        }
    }
}
