//! Untyped model instance: attribute → value mapping bound to its schema.

use crate::error::OrmError;
use crate::sql::ModelSchema;
use crate::store::Row;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Debug)]
pub struct Record {
    schema: &'static ModelSchema,
    values: Map<String, Value>,
}

impl Record {
    /// Empty record for a new row; defaults resolve lazily.
    pub fn new(schema: &'static ModelSchema) -> Self {
        Record {
            schema,
            values: Map::new(),
        }
    }

    pub fn from_row(schema: &'static ModelSchema, row: Row) -> Self {
        Record { schema, values: row }
    }

    /// Unset fields (`None` in the typed struct) stay absent.
    pub fn from_model<M: Serialize>(schema: &'static ModelSchema, model: &M) -> Result<Self, OrmError> {
        match serde_json::to_value(model)? {
            Value::Object(values) => Ok(Record { schema, values }),
            other => Err(OrmError::Decode(serde::de::Error::custom(format!(
                "model {} did not serialize to an object: {}",
                schema.name(),
                other
            )))),
        }
    }

    pub fn schema(&self) -> &'static ModelSchema {
        self.schema
    }

    /// Strict read: absent attributes are an error.
    pub fn get(&self, attr: &str) -> Result<&Value, OrmError> {
        self.values
            .get(attr)
            .ok_or_else(|| OrmError::MissingAttribute(attr.to_string()))
    }

    /// Current value, or null when unset.
    pub fn get_value(&self, attr: &str) -> Value {
        self.values.get(attr).cloned().unwrap_or(Value::Null)
    }

    /// Current value; on a miss the field's default is resolved, stored, and returned.
    pub fn get_value_or_default(&mut self, attr: &str) -> Result<Value, OrmError> {
        if let Some(v) = self.values.get(attr).filter(|v| !v.is_null()) {
            return Ok(v.clone());
        }
        let field = self.schema.field(attr).ok_or_else(|| OrmError::UnknownField {
            model: self.schema.name().to_string(),
            field: attr.to_string(),
        })?;
        let Some(default) = field.default_value() else {
            return Ok(Value::Null);
        };
        let value = default.resolve();
        tracing::debug!(attr = %attr, value = %value, "using default value");
        self.values.insert(attr.to_string(), value.clone());
        Ok(value)
    }

    pub fn set(&mut self, attr: &str, value: impl Into<Value>) {
        self.values.insert(attr.to_string(), value.into());
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    /// Insert arguments: every non-key field, then the key, each default-resolved.
    pub fn insert_args(&mut self) -> Result<Vec<Value>, OrmError> {
        let schema = self.schema;
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for f in schema.fields() {
            args.push(self.get_value_or_default(f)?);
        }
        args.push(self.get_value_or_default(schema.primary_key())?);
        Ok(args)
    }

    /// Update arguments: current values of every non-key field, then the key.
    pub fn update_args(&self) -> Vec<Value> {
        let mut args: Vec<Value> = self.schema.fields().iter().map(|f| self.get_value(f)).collect();
        args.push(self.key_value());
        args
    }

    pub fn key_value(&self) -> Value {
        self.get_value(self.schema.primary_key())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Field;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::OnceLock;

    static CALLS: AtomicU64 = AtomicU64::new(0);

    fn counted_id() -> Value {
        let n = CALLS.fetch_add(1, Ordering::SeqCst);
        Value::String(format!("id-{n}"))
    }

    fn fixed_id() -> Value {
        Value::String("id-fixed".into())
    }

    fn schema() -> &'static ModelSchema {
        static S: OnceLock<ModelSchema> = OnceLock::new();
        S.get_or_init(|| {
            ModelSchema::builder("Post")
                .table("posts")
                .field(Field::string("id").primary_key().default_with(fixed_id))
                .field(Field::string("title"))
                .field(Field::boolean("draft"))
                .build()
                .unwrap()
        })
    }

    fn counted_schema() -> &'static ModelSchema {
        static S: OnceLock<ModelSchema> = OnceLock::new();
        S.get_or_init(|| {
            ModelSchema::builder("Counted")
                .field(Field::string("id").primary_key().default_with(counted_id))
                .build()
                .unwrap()
        })
    }

    #[test]
    fn strict_get_rejects_absent_attribute() {
        let r = Record::new(schema());
        assert!(matches!(r.get("title"), Err(OrmError::MissingAttribute(a)) if a == "title"));
        assert_eq!(r.get_value("title"), Value::Null);
    }

    #[test]
    fn default_resolution_is_cached_and_resolves_once() {
        let mut r = Record::new(counted_schema());
        let before = CALLS.load(Ordering::SeqCst);
        let first = r.get_value_or_default("id").unwrap();
        let second = r.get_value_or_default("id").unwrap();
        assert_eq!(first, second);
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
        assert_eq!(r.get("id").unwrap(), &first);
    }

    #[test]
    fn insert_args_resolve_defaults_but_update_args_do_not() {
        let mut r = Record::new(schema());
        r.set("title", "hello");
        assert_eq!(r.update_args(), vec![json!("hello"), Value::Null, Value::Null]);

        let args = r.insert_args().unwrap();
        assert_eq!(args[0], json!("hello"));
        assert_eq!(args[1], json!(false));
        assert_eq!(args[2], json!("id-fixed"));
        assert_eq!(r.update_args()[2], args[2]);
    }

    #[test]
    fn field_without_default_resolves_to_null() {
        let mut r = Record::new(schema());
        assert_eq!(r.get_value_or_default("title").unwrap(), Value::Null);
        assert!(r.get("title").is_err());
        assert!(matches!(
            r.get_value_or_default("nope"),
            Err(OrmError::UnknownField { .. })
        ));
    }
}
