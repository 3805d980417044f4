//! Column descriptors attached to models.

use serde_json::Value;
use std::fmt;

/// Storage family of a field. Decides the default DDL and default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl FieldKind {
    fn label(self) -> &'static str {
        match self {
            FieldKind::String => "StringField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Integer => "IntegerField",
            FieldKind::Float => "FloatField",
            FieldKind::Text => "TextField",
        }
    }

    /// Booleans and text blobs never serve as keys.
    pub fn can_be_key(self) -> bool {
        !matches!(self, FieldKind::Boolean | FieldKind::Text)
    }
}

/// Default provider: a fixed value or a generator called on first resolution.
#[derive(Clone, Debug)]
pub enum DefaultValue {
    Static(Value),
    Generated(fn() -> Value),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Generated(f) => f(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    attr: String,
    column: Option<String>,
    kind: FieldKind,
    ddl: String,
    primary_key: bool,
    default: Option<DefaultValue>,
}

impl Field {
    fn with_kind(attr: &str, kind: FieldKind, ddl: &str, default: Option<DefaultValue>) -> Self {
        Field {
            attr: attr.to_string(),
            column: None,
            kind,
            ddl: ddl.to_string(),
            primary_key: false,
            default,
        }
    }

    pub fn string(attr: &str) -> Self {
        Self::with_kind(attr, FieldKind::String, "VARCHAR(100)", None)
    }

    pub fn boolean(attr: &str) -> Self {
        Self::with_kind(attr, FieldKind::Boolean, "BOOLEAN", Some(DefaultValue::Static(Value::Bool(false))))
    }

    pub fn integer(attr: &str) -> Self {
        Self::with_kind(attr, FieldKind::Integer, "BIGINT", Some(DefaultValue::Static(Value::from(0))))
    }

    /// Double precision: REAL in PostgreSQL is 4 bytes and loses epoch timestamps.
    pub fn float(attr: &str) -> Self {
        Self::with_kind(attr, FieldKind::Float, "DOUBLE PRECISION", Some(DefaultValue::Static(Value::from(0.0))))
    }

    pub fn text(attr: &str) -> Self {
        Self::with_kind(attr, FieldKind::Text, "TEXT", None)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Column name when it differs from the attribute name.
    pub fn column(mut self, name: &str) -> Self {
        self.column = Some(name.to_string());
        self
    }

    pub fn ddl(mut self, ddl: &str) -> Self {
        self.ddl = ddl.to_string();
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    pub fn default_with(mut self, generator: fn() -> Value) -> Self {
        self.default = Some(DefaultValue::Generated(generator));
        self
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }

    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.attr)
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn column_type(&self) -> &str {
        &self.ddl
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.kind.label(), self.ddl, self.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_carry_their_defaults() {
        assert_eq!(Field::boolean("admin").default_value().map(DefaultValue::resolve), Some(Value::Bool(false)));
        assert_eq!(Field::integer("n").default_value().map(DefaultValue::resolve), Some(Value::from(0)));
        assert!(Field::string("email").default_value().is_none());
        assert!(Field::text("content").default_value().is_none());
    }

    #[test]
    fn column_defaults_to_attribute() {
        let f = Field::string("user_name");
        assert_eq!(f.column_name(), "user_name");
        let f = f.column("author");
        assert_eq!(f.column_name(), "author");
        assert_eq!(f.attr(), "user_name");
    }

    #[test]
    fn display_shows_kind_type_and_column() {
        let f = Field::string("email").ddl("VARCHAR(50)");
        assert_eq!(f.to_string(), "<StringField, VARCHAR(50), email>");
    }
}
