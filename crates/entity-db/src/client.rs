//! Generic single-table entity client.
//!
//! `DbClient<T>` is bound to one table and one entity shape. Every operation:
//! 1. Obtains the pool from its [`PoolProvider`].
//! 2. Builds SQL text plus a positional parameter list from the entity's
//!    declared fields (see [`QueryParamSet`]).
//! 3. Executes, then renames returned columns to camelCase and deserializes
//!    them into `T`.
//!
//! `save` in [`SaveMode::UpdateLastEntity`] resolves an existing row the same
//! way `find` does and updates it by its identifier, inserting when nothing
//! matches.

use std::fmt;
use std::marker::PhantomData;

use futures::future::join_all;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DbClientConfig;
use crate::entity::Entity;
use crate::executor::{QueryPool, Row};
use crate::naming::{convert_row_keys, to_camel_case};
use crate::params::{quote_ident, QueryParamSet};
use crate::pool::{self, PoolProvider};
use crate::value::DbValue;
use crate::DbError;

// ---------------------------------------------------------------------------
// Save mode
// ---------------------------------------------------------------------------

/// How [`DbClient::save`] writes each entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Always insert a new row.
    Insert,
    /// Update the latest matching row, or insert when none matches.
    #[default]
    UpdateLastEntity,
    /// Any mode this client does not know. Entities are returned untouched.
    Other(String),
}

impl fmt::Display for SaveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "INSERT"),
            Self::UpdateLastEntity => write!(f, "UPDATE_LAST_ENTITY"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for SaveMode {
    fn from(s: &str) -> Self {
        match s {
            "INSERT" => Self::Insert,
            "UPDATE_LAST_ENTITY" => Self::UpdateLastEntity,
            _ => Self::Other(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// DbClient
// ---------------------------------------------------------------------------

/// Data client for entities of type `T` stored in one table.
pub struct DbClient<T, P = PgPool> {
    config: DbClientConfig,
    provider: PoolProvider<P>,
    /// Log tag: `"{component}|db table: {table}"`.
    component: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> DbClient<T, PgPool> {
    /// A client using the process-wide [`pool::global`] provider.
    pub fn new(config: DbClientConfig, component_name: &str) -> Self {
        Self::with_provider(config, component_name, pool::global().clone())
    }
}

impl<T: Entity, P: QueryPool> DbClient<T, P> {
    /// A client bound to an explicitly owned provider.
    pub fn with_provider(
        config: DbClientConfig,
        component_name: &str,
        provider: PoolProvider<P>,
    ) -> Self {
        let component = format!("{component_name}|db table: {}", config.table);
        if let Some(selector) = config.unique_selector.as_deref() {
            let unknown = undeclared_selector_fields::<T>(selector);
            if !unknown.is_empty() {
                warn!(
                    component = %component,
                    "unique selector names fields the entity does not declare: {unknown:?}"
                );
            }
        }
        Self {
            config,
            provider,
            component,
            _entity: PhantomData,
        }
    }

    pub fn config(&self) -> &DbClientConfig {
        &self.config
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Full address of the bound table, e.g. `"public"."quotes"`.
    pub fn table_name_with_schema(&self) -> String {
        format!(
            "{}.{}",
            quote_ident(&self.config.schema),
            quote_ident(&self.config.table)
        )
    }

    // -----------------------------------------------------------------------
    // Whole-table operations
    // -----------------------------------------------------------------------

    /// Every row of the table, in storage order.
    pub async fn get_all(&self) -> Result<Vec<T>, DbError> {
        let sql = format!("select * from {}", self.table_name_with_schema());
        self.query_entities(&sql, Vec::new()).await
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let sql = format!("select count(*)::int from {}", self.table_name_with_schema());
        let row = self.query_single(&sql, Vec::new()).await?;
        row.as_ref()
            .and_then(|row| row.get("count"))
            .and_then(JsonValue::as_i64)
            .ok_or(DbError::MissingColumn("count"))
    }

    /// Remove every row in a single statement.
    pub async fn delete_all(&self) -> Result<(), DbError> {
        let sql = format!("delete from {}", self.table_name_with_schema());
        self.query(&sql, Vec::new()).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Resolve the stored row for `entity`.
    ///
    /// - no id and no unique selector: `None`, no query is issued;
    /// - id present: the row with that id;
    /// - otherwise: the most recently modified row whose unique-selector
    ///   columns equal the entity's values. Other fields are ignored.
    ///
    /// Not finding a row is `Ok(None)`, never an error.
    pub async fn find(&self, entity: &T) -> Result<Option<T>, DbError> {
        info!(
            component = %self.component,
            "find: {}",
            serde_json::to_string(entity).unwrap_or_default()
        );

        let selector = match (entity.id(), self.config.unique_selector.as_deref()) {
            (Some(id), _) => {
                info!(component = %self.component, "find: entity has id, try to find it by id: {id}");
                return self.find_by_id(id).await;
            }
            (None, None) => {
                info!(
                    component = %self.component,
                    "find: entity is not found, there is no id or unique selector"
                );
                return Ok(None);
            }
            (None, Some(selector)) => selector,
        };

        info!(component = %self.component, "find: entity has no id, try to find it by unique selector");

        let entries: Vec<_> = entity
            .entries()
            .into_iter()
            .filter(|(name, _)| selector.iter().any(|s| s == name))
            .collect();

        if entries.is_empty() {
            info!(
                component = %self.component,
                "find: entity carries none of the unique selector fields {selector:?}"
            );
            return Ok(None);
        }

        let set = QueryParamSet::build(entries);
        let conditions = set.assignments().join(" and ");
        info!(
            component = %self.component,
            "find: unique selector: [{conditions}] with values: [{}]",
            set.values_for_log()
        );

        let sql = format!(
            "select * from {} where {} order by {} desc limit 1",
            self.table_name_with_schema(),
            conditions,
            quote_ident(&self.config.modified_at_column),
        );
        self.query_single_entity(&sql, set.values).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DbError> {
        let set = QueryParamSet::build(vec![("id", DbValue::Uuid(id))]);
        let sql = format!(
            "select * from {} where {}",
            self.table_name_with_schema(),
            set.assignments().join(" and "),
        );
        self.query_single_entity(&sql, set.values).await
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    /// Write every entity according to `mode` and return the stored rows in
    /// input order.
    ///
    /// Absent fields are never written; explicit nulls are. Entities are
    /// processed concurrently, each one's own statements in sequence. Two
    /// entities of one batch that resolve to the same stored row race with
    /// each other; nothing locks across the batch.
    ///
    /// # Errors
    /// Every entity's work runs to completion; the first failure in input
    /// order is then returned. Writes already made by other entities stay.
    pub async fn save(&self, entities: Vec<T>, mode: SaveMode) -> Result<Vec<T>, DbError> {
        let results = join_all(entities.into_iter().map(|entity| self.save_one(entity, &mode))).await;
        results.into_iter().collect()
    }

    async fn save_one(&self, entity: T, mode: &SaveMode) -> Result<T, DbError> {
        let entries = entity.entries();

        match mode {
            SaveMode::Insert => self.insert_one(entries).await,
            SaveMode::UpdateLastEntity => self.patch_one(&entity, entries).await,
            SaveMode::Other(name) => {
                warn!(component = %self.component, "save: unknown type of save mode: {name}");
                Ok(entity)
            }
        }
    }

    async fn insert_one(&self, entries: Vec<(&'static str, DbValue)>) -> Result<T, DbError> {
        let table = self.table_name_with_schema();

        let (sql, values) = if entries.is_empty() {
            info!(component = %self.component, "insertOne: insert default values");
            (format!("insert into {table} default values returning *"), Vec::new())
        } else {
            let set = QueryParamSet::build(entries);
            let fields = set.fields.join(", ");
            info!(
                component = %self.component,
                "insertOne: insert [{fields}] with values [{}]",
                set.values_for_log()
            );
            let sql = format!(
                "insert into {table} ({fields}) values ({}) returning *",
                set.placeholders.join(","),
            );
            (sql, set.values)
        };

        self.query_single_entity(&sql, values)
            .await?
            .ok_or(DbError::NoRowReturned("insert"))
    }

    async fn patch_one(&self, entity: &T, entries: Vec<(&'static str, DbValue)>) -> Result<T, DbError> {
        let Some(existing) = self.find(entity).await? else {
            return self.insert_one(entries).await;
        };
        let id = existing.id().ok_or(DbError::MissingColumn("id"))?;

        if entries.is_empty() {
            info!(component = %self.component, "patchOne: nothing to update for {id}");
            return Ok(existing);
        }

        let set = QueryParamSet::build(entries);
        info!(
            component = %self.component,
            "patchOne: patch [{}] with values [{}]",
            set.fields.join(", "),
            set.values_for_log()
        );

        let sql = format!(
            "update {} set {} where \"id\"=${} returning *",
            self.table_name_with_schema(),
            set.assignments().join(", "),
            set.len() + 1,
        );
        let mut values = set.values;
        values.push(DbValue::Uuid(id));

        self.query_single_entity(&sql, values)
            .await?
            .ok_or(DbError::NoRowReturned("update"))
    }

    // -----------------------------------------------------------------------
    // Raw queries
    // -----------------------------------------------------------------------

    /// Run arbitrary SQL against the client's pool. Returned keys are
    /// camelCase.
    pub async fn query(&self, sql: &str, params: Vec<DbValue>) -> Result<Vec<Row>, DbError> {
        let pool = self.provider.get()?;
        let rows = pool.query(sql, params).await?;
        Ok(convert_row_keys(rows, to_camel_case))
    }

    /// First row of [`query`](Self::query), if any.
    pub async fn query_single(&self, sql: &str, params: Vec<DbValue>) -> Result<Option<Row>, DbError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    async fn query_entities(&self, sql: &str, params: Vec<DbValue>) -> Result<Vec<T>, DbError> {
        self.query(sql, params)
            .await?
            .into_iter()
            .map(row_to_entity)
            .collect()
    }

    async fn query_single_entity(&self, sql: &str, params: Vec<DbValue>) -> Result<Option<T>, DbError> {
        self.query_single(sql, params)
            .await?
            .map(row_to_entity)
            .transpose()
    }
}

/// Selector entries that match none of `T`'s declared field names. Such an
/// entry never takes part in a lookup.
pub(crate) fn undeclared_selector_fields<T: Entity>(selector: &[String]) -> Vec<&str> {
    let declared = T::fields();
    selector
        .iter()
        .map(String::as_str)
        .filter(|name| !declared.iter().any(|field| field.name() == *name))
        .collect()
}

fn row_to_entity<T: Entity>(row: Row) -> Result<T, DbError> {
    Ok(serde_json::from_value(JsonValue::Object(row))?)
}
