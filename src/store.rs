//! Data access: the pooled database handle, parameterized selects and writes.

use crate::config::DbConfig;
use crate::error::OrmError;
use crate::sql::{bind_all, to_native_placeholders, ModelSchema};
use futures::{StreamExt, TryStreamExt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::{PgColumn, PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Connection, PgPool};

/// One result row, keyed by column label.
pub type Row = Map<String, Value>;

/// Handle to the connection pool. Cheap to clone; owned by the process bootstrap.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    autocommit: bool,
}

fn connect_options(cfg: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.database)
        .options([("client_encoding", cfg.charset.as_str())])
}

fn pool_options(cfg: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(cfg.max_size)
        .min_connections(cfg.min_size)
}

impl Database {
    pub async fn connect(cfg: &DbConfig) -> Result<Self, OrmError> {
        tracing::info!(host = %cfg.host, port = cfg.port, database = %cfg.database, "create database connection pool");
        let pool = pool_options(cfg).connect_with(connect_options(cfg)).await?;
        Ok(Self::from_pool(pool, cfg.autocommit))
    }

    /// Pool that opens connections on first use.
    pub fn connect_lazy(cfg: &DbConfig) -> Self {
        let pool = pool_options(cfg).connect_lazy_with(connect_options(cfg));
        Self::from_pool(pool, cfg.autocommit)
    }

    pub fn from_pool(pool: PgPool, autocommit: bool) -> Self {
        Database { pool, autocommit }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pool-wide default for model writes.
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Run a select; returns all rows, or at most `limit` rows.
    pub async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>, OrmError> {
        tracing::debug!(sql = %sql, args = ?args, "SQL");
        let native = to_native_placeholders(sql);
        let mut conn = self.pool.acquire().await?;
        let query = bind_all(sqlx::query(&native), args);
        let rows: Vec<PgRow> = match limit {
            Some(n) => query.fetch(&mut *conn).take(n).try_collect().await?,
            None => query.fetch_all(&mut *conn).await?,
        };
        tracing::debug!(rows = rows.len(), "rows returned");
        rows.iter().map(row_to_map).collect()
    }

    /// Run a write and return the affected row count. With `autocommit` off the statement
    /// runs in its own transaction, rolled back on failure.
    pub async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64, OrmError> {
        tracing::debug!(sql = %sql, args = ?args, autocommit, "SQL");
        let native = to_native_placeholders(sql);
        let mut conn = self.pool.acquire().await?;
        if autocommit {
            let done = bind_all(sqlx::query(&native), args).execute(&mut *conn).await?;
            return Ok(done.rows_affected());
        }
        let mut tx = conn.begin().await?;
        match bind_all(sqlx::query(&native), args).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit().await?;
                Ok(done.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Create each model's table if it does not exist yet.
    pub async fn ensure_tables(&self, schemas: &[&ModelSchema]) -> Result<(), OrmError> {
        for schema in schemas {
            let ddl = schema.create_table_sql();
            tracing::info!(table = %schema.table(), "ensure table");
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), OrmError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        tracing::info!("close database connection pool");
        self.pool.close().await;
    }
}

fn row_to_map(row: &PgRow) -> Result<Row, OrmError> {
    use sqlx::{Column, Row as _};
    let mut map = Map::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col)?);
    }
    Ok(map)
}

fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// Integral NUMERIC values become JSON integers, the rest JSON floats.
fn decimal_to_value(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(n) = d.to_i64() {
            return Value::from(n);
        }
    }
    d.to_f64().map_or(Value::Null, float_value)
}

/// Decode one cell by its declared column type. SQL NULL maps to JSON null.
fn cell_to_value(row: &PgRow, col: &PgColumn) -> Result<Value, OrmError> {
    use sqlx::{Column, Row as _, TypeInfo};
    let name = col.name();
    let value = match col.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(name)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(name)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(name)?.map(|n| float_value(f64::from(n))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(name)?.map(float_value),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(name)?.map(decimal_to_value),
        "BOOL" => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        "UUID" => row.try_get::<Option<uuid::Uuid>, _>(name)?.map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(name)?
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(name)?,
        other => {
            return Err(OrmError::UnsupportedColumn {
                column: name.to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
