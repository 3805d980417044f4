//! Typed entities on top of `Record`: the find/save/update/remove surface.

use crate::error::{OrmError, SchemaError};
use crate::model::record::Record;
use crate::sql::{find_number_sql, FindAll, ModelSchema};
use crate::store::Database;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Per-type registration slot. The schema is built on first access and never rebuilt;
/// a failed build is remembered and reported on every later access.
pub struct SchemaCell(OnceLock<Result<ModelSchema, SchemaError>>);

impl SchemaCell {
    pub const fn new() -> Self {
        SchemaCell(OnceLock::new())
    }

    pub fn get_or_register<F>(&'static self, build: F) -> Result<&'static ModelSchema, SchemaError>
    where
        F: FnOnce() -> Result<ModelSchema, SchemaError>,
    {
        let slot = self.0.get_or_init(|| {
            let built = build();
            match &built {
                Ok(schema) => tracing::info!(
                    model = %schema.name(),
                    table = %schema.table(),
                    primary_key = %schema.primary_key(),
                    fields = ?schema.fields(),
                    "model registered"
                ),
                Err(e) => tracing::error!(error = %e, "model registration failed"),
            }
            built
        });
        slot.as_ref().map_err(Clone::clone)
    }
}

impl Default for SchemaCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A persisted entity. Implementors supply `schema()`; every query method has a default.
///
/// Fields that carry a column default should be `Option` and skipped when `None`, so the
/// default provider runs on `save`.
#[async_trait]
pub trait Model: Serialize + DeserializeOwned + Send + Sync + Sized {
    fn schema() -> Result<&'static ModelSchema, OrmError>;

    fn to_record(&self) -> Result<Record, OrmError> {
        Record::from_model(Self::schema()?, self)
    }

    fn from_record(record: Record) -> Result<Self, OrmError> {
        Ok(serde_json::from_value(Value::Object(record.into_values()))?)
    }

    /// Lookup by primary key.
    async fn find(db: &Database, pk: Value) -> Result<Option<Self>, OrmError> {
        let schema = Self::schema()?;
        let rows = db.select(&schema.select_by_key_sql(), &[pk], Some(1)).await?;
        rows.into_iter()
            .next()
            .map(|row| Self::from_record(Record::from_row(schema, row)))
            .transpose()
    }

    async fn find_all(db: &Database, opts: FindAll) -> Result<Vec<Self>, OrmError> {
        let schema = Self::schema()?;
        let query = opts.to_query(schema);
        let rows = db.select(&query.sql, &query.params, None).await?;
        rows.into_iter()
            .map(|row| Self::from_record(Record::from_row(schema, row)))
            .collect()
    }

    /// Single scalar from `SELECT <expr> AS _num_ ...`, or `None` when no row matches.
    async fn find_number(
        db: &Database,
        expr: &str,
        filter: Option<&str>,
        args: &[Value],
    ) -> Result<Option<Value>, OrmError> {
        let schema = Self::schema()?;
        let sql = find_number_sql(schema, expr, filter);
        let rows = db.select(&sql, args, Some(1)).await?;
        Ok(rows.into_iter().next().and_then(|mut row| row.remove("_num_")))
    }

    /// Insert. Unset fields take their defaults, which are written back into `self`.
    async fn save(&mut self, db: &Database) -> Result<(), OrmError> {
        let schema = Self::schema()?;
        let mut record = self.to_record()?;
        let args = record.insert_args()?;
        let rows = db.execute(schema.insert_sql(), &args, db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(model = %schema.name(), rows, "failed to insert record");
        }
        *self = Self::from_record(record)?;
        Ok(())
    }

    /// Update by key with current values; defaults are not consulted.
    async fn update(&self, db: &Database) -> Result<(), OrmError> {
        let schema = Self::schema()?;
        let args = self.to_record()?.update_args();
        let rows = db.execute(schema.update_sql(), &args, db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(model = %schema.name(), rows, "failed to update by primary key");
        }
        Ok(())
    }

    async fn remove(&self, db: &Database) -> Result<(), OrmError> {
        let schema = Self::schema()?;
        let key = self.to_record()?.key_value();
        let rows = db.execute(schema.delete_sql(), &[key], db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(model = %schema.name(), rows, "failed to remove by primary key");
        }
        Ok(())
    }
}
