//! Raw clause assembly on top of the schema templates, and placeholder rewriting.
//!
//! WHERE / ORDER BY fragments are appended verbatim; only `args` are bound as parameters.

use crate::error::OrmError;
use crate::sql::schema::ModelSchema;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from model declarations).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// `n` neutral placeholders joined by commas.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Rewrite neutral `?` markers into PostgreSQL `$1..$n`. Markers inside single-quoted
/// literals and double-quoted identifiers are kept.
pub fn to_native_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0u32;
    let mut open: Option<char> = None;
    for c in sql.chars() {
        match (open, c) {
            (None, '\'' | '"') => open = Some(c),
            (Some(q), _) if q == c => open = None,
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
                continue;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Row limit for `find_all`: a count, or an offset plus a count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(i64),
    Range { offset: i64, count: i64 },
}

impl TryFrom<&Value> for Limit {
    type Error = OrmError;

    /// Accepts an integer or a two-element integer array `[offset, count]`.
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Number(n) => n
                .as_i64()
                .map(Limit::Count)
                .ok_or_else(|| OrmError::InvalidLimit(v.to_string())),
            Value::Array(items) => match items.as_slice() {
                [offset, count] => match (offset.as_i64(), count.as_i64()) {
                    (Some(offset), Some(count)) => Ok(Limit::Range { offset, count }),
                    _ => Err(OrmError::InvalidLimit(v.to_string())),
                },
                _ => Err(OrmError::InvalidLimit(v.to_string())),
            },
            _ => Err(OrmError::InvalidLimit(v.to_string())),
        }
    }
}

/// Options for `Model::find_all`.
#[derive(Clone, Debug, Default)]
pub struct FindAll {
    pub filter: Option<String>,
    pub args: Vec<Value>,
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw WHERE fragment with `?` markers, plus its arguments.
    pub fn filter(mut self, clause: &str, args: Vec<Value>) -> Self {
        self.filter = Some(clause.to_string());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by = Some(order.to_string());
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_query(&self, schema: &ModelSchema) -> QueryBuf {
        let mut sql = schema.select_sql().to_string();
        let mut params = self.args.clone();
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if let Some(order) = self.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        match self.limit {
            Some(Limit::Count(n)) => {
                sql.push_str(" LIMIT ?");
                params.push(Value::from(n));
            }
            Some(Limit::Range { offset, count }) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                params.push(Value::from(count));
                params.push(Value::from(offset));
            }
            None => {}
        }
        QueryBuf { sql, params }
    }
}

/// `SELECT <expr> AS _num_ FROM <table> [WHERE ...]`.
pub fn find_number_sql(schema: &ModelSchema, expr: &str, filter: Option<&str>) -> String {
    let mut sql = format!("SELECT {} AS _num_ FROM {}", expr, quoted(schema.table()));
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::field::Field;
    use serde_json::json;

    fn users() -> ModelSchema {
        ModelSchema::builder("User")
            .table("users")
            .field(Field::string("id").primary_key())
            .field(Field::string("email"))
            .build()
            .unwrap()
    }

    #[test]
    fn placeholders_become_positional() {
        assert_eq!(
            to_native_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
        assert_eq!(
            to_native_placeholders("SELECT '?' AS q FROM t WHERE a = ?"),
            "SELECT '?' AS q FROM t WHERE a = $1"
        );
    }

    #[test]
    fn quoted_identifiers_do_not_open_literals() {
        let sql = format!("DELETE FROM {} WHERE {} = ?", quoted("o'brien"), quoted("id"));
        assert_eq!(to_native_placeholders(&sql), r#"DELETE FROM "o'brien" WHERE "id" = $1"#);
        assert_eq!(
            to_native_placeholders(r#"SELECT "a?b" FROM t WHERE x = ? AND y = 'it''s' AND z = ?"#),
            r#"SELECT "a?b" FROM t WHERE x = $1 AND y = 'it''s' AND z = $2"#
        );
    }

    #[test]
    fn find_all_appends_clauses_and_count_limit() {
        let q = FindAll::new()
            .filter("\"email\" = ?", vec![json!("a@b.c")])
            .order_by("created_at DESC")
            .limit(Limit::Count(5))
            .to_query(&users());
        assert_eq!(
            q.sql,
            r#"SELECT "id", "email" FROM "users" WHERE "email" = ? ORDER BY created_at DESC LIMIT ?"#
        );
        assert_eq!(q.params, vec![json!("a@b.c"), json!(5)]);
    }

    #[test]
    fn range_limit_binds_count_then_offset() {
        let q = FindAll::new().limit(Limit::Range { offset: 10, count: 5 }).to_query(&users());
        assert!(q.sql.ends_with(" LIMIT ? OFFSET ?"));
        assert_eq!(q.params, vec![json!(5), json!(10)]);
    }

    #[test]
    fn limit_shapes() {
        assert_eq!(Limit::try_from(&json!(5)).unwrap(), Limit::Count(5));
        assert_eq!(
            Limit::try_from(&json!([10, 5])).unwrap(),
            Limit::Range { offset: 10, count: 5 }
        );
        assert!(matches!(Limit::try_from(&json!([1, 2, 3])), Err(OrmError::InvalidLimit(_))));
        assert!(matches!(Limit::try_from(&json!("5")), Err(OrmError::InvalidLimit(_))));
        assert!(matches!(Limit::try_from(&json!(2.5)), Err(OrmError::InvalidLimit(_))));
    }

    #[test]
    fn find_number_wraps_expression() {
        assert_eq!(
            find_number_sql(&users(), "COUNT(id)", None),
            r#"SELECT COUNT(id) AS _num_ FROM "users""#
        );
        assert_eq!(
            find_number_sql(&users(), "COUNT(id)", Some("admin = ?")),
            r#"SELECT COUNT(id) AS _num_ FROM "users" WHERE admin = ?"#
        );
    }
}
