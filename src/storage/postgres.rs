//! PostgreSQL listing store using sqlx.
//!
//! Provides `PostgresListingStore<T>` backed by a PostgreSQL database via
//! `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! listing-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! Entities live in a shared `entities` table with common columns
//! (id, entity_type, name, timestamps) and a JSONB `data` column for
//! type-specific fields. Predicates and orders are rendered with
//! `sqlx::QueryBuilder`: values are always bound, and field names are
//! interpolated only after checking them against the entity's field set.

use crate::core::{Listable, ListingQuery, ListingStore, Page, Predicate, SortColumn};
use crate::core::error::StorageError;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{TryStreamExt, future};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Common entity fields stored in dedicated columns (excluded from JSON data).
const COMMON_COLUMNS: &[&str] = &["id", "name", "created_at", "updated_at"];

/// Common columns holding timestamps
const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at"];

const BACKEND: &str = "PostgreSQL";

/// Apply the required table and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS entities (
            id UUID PRIMARY KEY,
            entity_type VARCHAR(255) NOT NULL,
            name VARCHAR(255) NOT NULL DEFAULT '',
            data JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| anyhow!("Failed to create entities table: {}", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_type_name ON entities (entity_type, name)")
        .execute(pool)
        .await
        .map_err(|e| anyhow!("Failed to create entities index: {}", e))?;

    Ok(())
}

/// Listing store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// use sqlx::PgPool;
/// use listing::storage::PostgresListingStore;
///
/// let pool = PgPool::connect("postgres://localhost/directory").await?;
/// let store = PostgresListingStore::<Tool>::new(pool);
/// let result = search(&store, &spec, &state, None).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresListingStore<T> {
    pool: PgPool,
    _marker: std::marker::PhantomData<T>,
}

impl<T> PostgresListingStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<T: Listable + Serialize + DeserializeOwned> PostgresListingStore<T> {
    /// Insert or replace a record
    pub async fn upsert(&self, entity: &T) -> Result<()> {
        let mut data = serde_json::to_value(entity)
            .map_err(|e| anyhow!("Failed to serialize entity: {}", e))?;
        if let Some(obj) = data.as_object_mut() {
            for field in COMMON_COLUMNS {
                obj.remove(*field);
            }
        }

        sqlx::query(
            "INSERT INTO entities (id, entity_type, name, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, data = EXCLUDED.data, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(entity.id())
        .bind(T::resource_name_singular())
        .bind(entity.name())
        .bind(&data)
        .bind(entity.created_at())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| query_error(format!("Failed to upsert entity: {}", e)))?;

        Ok(())
    }

    /// Rebuild an entity from its columns and JSON data
    fn reconstruct(
        id: Uuid,
        name: String,
        data: serde_json::Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<T> {
        let mut json = if data.is_object() {
            data
        } else {
            serde_json::json!({})
        };

        if let Some(obj) = json.as_object_mut() {
            obj.insert("id".into(), serde_json::json!(id));
            obj.insert("name".into(), serde_json::json!(name));
            obj.insert("created_at".into(), serde_json::to_value(created_at)?);
            obj.insert("updated_at".into(), serde_json::to_value(updated_at)?);
        }

        serde_json::from_value::<T>(json)
            .map_err(|e| anyhow!("Failed to deserialize entity from row: {}", e))
    }
}

fn query_error(message: String) -> anyhow::Error {
    anyhow::Error::new(StorageError::QueryError {
        backend: BACKEND.to_string(),
        message,
    })
}

/// SQL expression reading a field, as text
fn text_expr<T: Listable>(field: &str) -> Result<String> {
    if !T::has_field(field) {
        return Err(anyhow!("Field '{}' is not a field of {}", field, T::resource_name()));
    }
    Ok(if COMMON_COLUMNS.contains(&field) {
        format!("{}::text", field)
    } else {
        format!("(data->>'{}')", field)
    })
}

/// SQL expression reading a field as a timestamp
fn timestamp_expr<T: Listable>(field: &str) -> Result<String> {
    if !T::has_field(field) {
        return Err(anyhow!("Field '{}' is not a field of {}", field, T::resource_name()));
    }
    Ok(if TIMESTAMP_COLUMNS.contains(&field) {
        field.to_string()
    } else {
        format!("(data->>'{}')::timestamptz", field)
    })
}

/// SQL expression ordering a field.
///
/// Common text columns compare case-insensitively. JSONB values keep their
/// type, so numbers order numerically; strings among them are lowercased.
fn order_expr<T: Listable>(field: &str) -> Result<String> {
    if TIMESTAMP_COLUMNS.contains(&field) {
        return timestamp_expr::<T>(field);
    }
    let text = text_expr::<T>(field)?;
    Ok(if COMMON_COLUMNS.contains(&field) {
        format!("lower({})", text)
    } else {
        format!(
            "(CASE jsonb_typeof(data->'{f}') WHEN 'string' THEN to_jsonb(lower({t})) ELSE (data->'{f}') END)",
            f = field,
            t = text
        )
    })
}

/// Escape LIKE wildcards in a user value
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append a predicate to a query under construction
pub(crate) fn push_predicate<T: Listable>(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicate: &Predicate,
) -> Result<()> {
    match predicate {
        Predicate::Contains { field, value } => {
            builder.push(text_expr::<T>(field)?);
            builder.push(" ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(value)));
            builder.push(" ESCAPE '\\'");
        }
        Predicate::StartsWith { field, value } => {
            builder.push(text_expr::<T>(field)?);
            builder.push(" ILIKE ");
            builder.push_bind(format!("{}%", escape_like(value)));
            builder.push(" ESCAPE '\\'");
        }
        Predicate::StartsWithDigit { field } => {
            builder.push(text_expr::<T>(field)?);
            builder.push(" ~ '^[0-9]'");
        }
        Predicate::Equals { field, value } => {
            let text = value.to_text().unwrap_or_default();
            if COMMON_COLUMNS.contains(&field.as_str()) {
                builder.push(text_expr::<T>(field)?);
                builder.push(" = ");
                builder.push_bind(text);
            } else {
                text_expr::<T>(field)?;
                // Scalar equality, or membership when the field holds an array
                builder.push(format!("((data->>'{}') = ", field));
                builder.push_bind(text.clone());
                builder.push(format!(" OR (data->'{}') ? ", field));
                builder.push_bind(text);
                builder.push(")");
            }
        }
        Predicate::DateRange { field, from, to } => {
            let expr = timestamp_expr::<T>(field)?;
            builder.push("(");
            match (from, to) {
                (None, None) => {
                    builder.push("TRUE");
                }
                (Some(from), None) => {
                    builder.push(format!("{}::date >= ", expr));
                    builder.push_bind(*from);
                }
                (None, Some(to)) => {
                    builder.push(format!("{}::date <= ", expr));
                    builder.push_bind(*to);
                }
                (Some(from), Some(to)) => {
                    builder.push(format!("{}::date >= ", expr));
                    builder.push_bind(*from);
                    builder.push(format!(" AND {}::date <= ", expr));
                    builder.push_bind(*to);
                }
            }
            builder.push(")");
        }
        Predicate::All(children) => push_group::<T>(builder, children, " AND ", "TRUE")?,
        Predicate::Any(children) => push_group::<T>(builder, children, " OR ", "FALSE")?,
    }
    Ok(())
}

fn push_group<T: Listable>(
    builder: &mut QueryBuilder<'_, Postgres>,
    children: &[Predicate],
    separator: &str,
    empty: &str,
) -> Result<()> {
    if children.is_empty() {
        builder.push(empty);
        return Ok(());
    }
    builder.push("(");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate::<T>(builder, child)?;
    }
    builder.push(")");
    Ok(())
}

/// Append `FROM entities WHERE ...` for a listing query
pub(crate) fn push_from_where<T: Listable>(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &ListingQuery,
) -> Result<()> {
    builder.push(" FROM entities WHERE entity_type = ");
    builder.push_bind(T::resource_name_singular().to_string());
    if let Some(predicate) = &query.predicate {
        builder.push(" AND ");
        push_predicate::<T>(builder, predicate)?;
    }
    Ok(())
}

/// Append `ORDER BY ... LIMIT ... OFFSET ...`
pub(crate) fn push_order_window<T: Listable>(
    builder: &mut QueryBuilder<'_, Postgres>,
    order: &[SortColumn],
    limit: usize,
    offset: usize,
) -> Result<()> {
    if !order.is_empty() {
        builder.push(" ORDER BY ");
        for (i, column) in order.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(order_expr::<T>(&column.id)?);
            builder.push(if column.desc { " DESC" } else { " ASC" });
        }
    }
    builder.push(" LIMIT ");
    builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    builder.push(" OFFSET ");
    builder.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    Ok(())
}

type EntityRow = (
    Uuid,
    String,
    serde_json::Value,
    DateTime<Utc>,
    DateTime<Utc>,
);

#[async_trait]
impl<T: Listable + Serialize + DeserializeOwned> ListingStore<T> for PostgresListingStore<T> {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<T>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_from_where::<T>(&mut count, query)?;

        let mut select =
            QueryBuilder::<Postgres>::new("SELECT id, name, data, created_at, updated_at");
        push_from_where::<T>(&mut select, query)?;
        push_order_window::<T>(&mut select, &query.order, query.limit, query.offset)?;

        // Both reads observe one snapshot
        let mut tx = self.pool.begin().await.map_err(|e| {
            anyhow::Error::new(StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            })
        })?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                anyhow::Error::new(StorageError::TransactionError {
                    message: e.to_string(),
                })
            })?;

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| query_error(format!("Failed to count entities: {}", e)))?;

        let items: Vec<T> = select
            .build_query_as::<EntityRow>()
            .fetch(&mut *tx)
            .map_err(|e| query_error(format!("Failed to list entities: {}", e)))
            .and_then(|(id, name, data, created_at, updated_at)| {
                future::ready(Self::reconstruct(id, name, data, created_at, updated_at))
            })
            .try_collect()
            .await?;

        tx.commit().await.map_err(|e| {
            anyhow::Error::new(StorageError::TransactionError {
                message: e.to_string(),
            })
        })?;

        Ok(Page {
            items,
            total: usize::try_from(total).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, Tool};

    fn where_sql(predicate: Predicate) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_from_where::<Tool>(
            &mut builder,
            &ListingQuery {
                predicate: Some(predicate),
                order: vec![],
                offset: 0,
                limit: 10,
            },
        )
        .unwrap();
        builder.sql().to_string()
    }

    #[test]
    fn test_contains_binds_value() {
        let sql = where_sql(Predicate::contains("name", "50%"));
        assert!(sql.contains("name::text ILIKE $2"));
        assert!(!sql.contains("50"));
    }

    #[test]
    fn test_data_field_equality() {
        let sql = where_sql(Predicate::equals("category", "ai"));
        assert!(sql.contains("(data->>'category') = $2"));
        assert!(sql.contains("(data->'category') ? $3"));
    }

    #[test]
    fn test_unknown_field_is_refused() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1");
        let result = push_predicate::<Tool>(
            &mut builder,
            &Predicate::contains("name'); DROP TABLE entities; --", "x"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_order_window() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id");
        push_order_window::<Tool>(
            &mut builder,
            &[SortColumn::desc("name"), SortColumn::asc("created_at")],
            10,
            20,
        )
        .unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id ORDER BY lower(name::text) DESC, created_at ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_order_window_keeps_jsonb_numbers_typed() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id");
        push_order_window::<Category>(
            &mut builder,
            &[SortColumn::asc("order"), SortColumn::asc("created_at")],
            25,
            0,
        )
        .unwrap();
        let sql = builder.sql();
        assert!(sql.contains("ELSE (data->'order') END) ASC"));
        assert!(!sql.contains("lower((data->>'order')) ASC"));
        assert!(sql.ends_with("created_at ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_order_window_refuses_unknown_field() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id");
        let result = push_order_window::<Category>(&mut builder, &[SortColumn::asc("secretField")], 25, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
    }
}
