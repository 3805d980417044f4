//! Model registry: derives table metadata and statement templates from declared fields.

use crate::error::SchemaError;
use crate::sql::builder::{placeholders, quoted};
use crate::sql::field::Field;
use std::collections::HashMap;

/// Everything the ORM needs to know about one model, computed once at registration.
#[derive(Clone, Debug)]
pub struct ModelSchema {
    name: String,
    table: String,
    primary_key: String,
    /// Non-key attributes in declaration order.
    fields: Vec<String>,
    declared: Vec<Field>,
    mappings: HashMap<String, usize>,
    select: String,
    insert: String,
    update: String,
    delete: String,
}

pub struct ModelSchemaBuilder {
    name: String,
    table: Option<String>,
    fields: Vec<Field>,
}

impl ModelSchema {
    pub fn builder(name: &str) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            name: name.to_string(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.mappings.get(attr).and_then(|&i| self.declared.get(i))
    }

    pub fn select_sql(&self) -> &str {
        &self.select
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert
    }

    pub fn update_sql(&self) -> &str {
        &self.update
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete
    }

    pub fn select_by_key_sql(&self) -> String {
        format!("{} WHERE {} = ?", self.select, self.quoted_column(&self.primary_key))
    }

    pub fn create_table_sql(&self) -> String {
        let mut defs: Vec<String> = self
            .declared
            .iter()
            .map(|f| {
                let mut def = format!("{} {}", quoted(f.column_name()), f.column_type());
                if f.is_primary_key() {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        defs.push(format!("PRIMARY KEY ({})", self.quoted_column(&self.primary_key)));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            quoted(&self.table),
            defs.join(",\n  ")
        )
    }

    fn quoted_column(&self, attr: &str) -> String {
        quoted(self.field(attr).map(Field::column_name).unwrap_or(attr))
    }

    /// Select-list entry: the column, aliased back to the attribute when they differ.
    fn select_item(&self, attr: &str) -> String {
        match self.field(attr) {
            Some(f) if f.column_name() != attr => format!("{} AS {}", quoted(f.column_name()), quoted(attr)),
            _ => quoted(attr),
        }
    }
}

impl ModelSchemaBuilder {
    /// Table name; defaults to the model name.
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates the declaration and derives the statement templates.
    pub fn build(self) -> Result<ModelSchema, SchemaError> {
        let table = self.table.unwrap_or_else(|| self.name.clone());
        tracing::info!(model = %self.name, table = %table, "found model");

        let mut mappings = HashMap::new();
        let mut fields = Vec::new();
        let mut primary_key: Option<String> = None;
        for (i, f) in self.fields.iter().enumerate() {
            tracing::debug!(attr = %f.attr(), field = %f, "found mapping");
            if mappings.insert(f.attr().to_string(), i).is_some() {
                return Err(SchemaError::DuplicateField(f.attr().to_string()));
            }
            if f.is_primary_key() {
                if !f.kind().can_be_key() {
                    return Err(SchemaError::InvalidPrimaryKey(f.attr().to_string()));
                }
                if primary_key.is_some() {
                    return Err(SchemaError::DuplicatePrimaryKey(f.attr().to_string()));
                }
                primary_key = Some(f.attr().to_string());
            } else {
                fields.push(f.attr().to_string());
            }
        }
        let primary_key = primary_key.ok_or_else(|| SchemaError::MissingPrimaryKey(self.name.clone()))?;

        let mut schema = ModelSchema {
            name: self.name,
            table,
            primary_key,
            fields,
            declared: self.fields,
            mappings,
            select: String::new(),
            insert: String::new(),
            update: String::new(),
            delete: String::new(),
        };

        let table = quoted(&schema.table);
        let pk = schema.quoted_column(&schema.primary_key);
        let mut select_items = vec![schema.select_item(&schema.primary_key)];
        select_items.extend(schema.fields.iter().map(|f| schema.select_item(f)));
        let mut insert_cols: Vec<String> = schema.fields.iter().map(|f| schema.quoted_column(f)).collect();
        insert_cols.push(pk.clone());
        let sets: Vec<String> = schema
            .fields
            .iter()
            .map(|f| format!("{} = ?", schema.quoted_column(f)))
            .collect();

        schema.select = format!("SELECT {} FROM {}", select_items.join(", "), table);
        schema.insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            insert_cols.join(", "),
            placeholders(insert_cols.len())
        );
        schema.update = format!("UPDATE {} SET {} WHERE {} = ?", table, sets.join(", "), pk);
        schema.delete = format!("DELETE FROM {} WHERE {} = ?", table, pk);
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> ModelSchema {
        ModelSchema::builder("Blog")
            .table("blogs")
            .field(Field::string("id").primary_key().ddl("VARCHAR(50)"))
            .field(Field::string("user_id"))
            .field(Field::string("name"))
            .field(Field::float("created_at"))
            .build()
            .unwrap()
    }

    #[test]
    fn derives_statement_templates_in_declaration_order() {
        let s = blog();
        assert_eq!(s.primary_key(), "id");
        assert_eq!(s.fields(), &["user_id", "name", "created_at"]);
        assert_eq!(
            s.select_sql(),
            r#"SELECT "id", "user_id", "name", "created_at" FROM "blogs""#
        );
        assert_eq!(
            s.insert_sql(),
            r#"INSERT INTO "blogs" ("user_id", "name", "created_at", "id") VALUES (?, ?, ?, ?)"#
        );
        assert_eq!(
            s.update_sql(),
            r#"UPDATE "blogs" SET "user_id" = ?, "name" = ?, "created_at" = ? WHERE "id" = ?"#
        );
        assert_eq!(s.delete_sql(), r#"DELETE FROM "blogs" WHERE "id" = ?"#);
        assert_eq!(
            s.select_by_key_sql(),
            r#"SELECT "id", "user_id", "name", "created_at" FROM "blogs" WHERE "id" = ?"#
        );
    }

    #[test]
    fn table_defaults_to_model_name() {
        let s = ModelSchema::builder("Tag")
            .field(Field::integer("id").primary_key())
            .build()
            .unwrap();
        assert_eq!(s.table(), "Tag");
        assert_eq!(s.insert_sql(), r#"INSERT INTO "Tag" ("id") VALUES (?)"#);
    }

    #[test]
    fn missing_primary_key_fails_registration() {
        let err = ModelSchema::builder("Note")
            .field(Field::string("title"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey("Note".into()));
    }

    #[test]
    fn second_primary_key_fails_registration() {
        let err = ModelSchema::builder("Note")
            .field(Field::string("id").primary_key())
            .field(Field::string("slug").primary_key())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicatePrimaryKey("slug".into()));
    }

    #[test]
    fn boolean_key_and_duplicate_attr_are_rejected() {
        let err = ModelSchema::builder("Flag")
            .field(Field::boolean("on").primary_key())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::InvalidPrimaryKey("on".into()));

        let err = ModelSchema::builder("Dup")
            .field(Field::string("id").primary_key())
            .field(Field::string("name"))
            .field(Field::text("name"))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("name".into()));
    }

    #[test]
    fn renamed_column_is_aliased_in_select_and_used_in_writes() {
        let s = ModelSchema::builder("Comment")
            .table("comments")
            .field(Field::string("id").primary_key())
            .field(Field::string("author").column("user_name"))
            .build()
            .unwrap();
        assert_eq!(s.select_sql(), r#"SELECT "id", "user_name" AS "author" FROM "comments""#);
        assert_eq!(s.update_sql(), r#"UPDATE "comments" SET "user_name" = ? WHERE "id" = ?"#);
    }

    #[test]
    fn create_table_uses_declared_types() {
        let ddl = blog().create_table_sql();
        assert!(ddl.starts_with(r#"CREATE TABLE IF NOT EXISTS "blogs" ("#));
        assert!(ddl.contains(r#""id" VARCHAR(50) NOT NULL"#));
        assert!(ddl.contains(r#""created_at" DOUBLE PRECISION"#));
        assert!(ddl.contains(r#"PRIMARY KEY ("id")"#));
    }
}
