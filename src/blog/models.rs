//! Blog entities: users, posts, comments.

use crate::error::OrmError;
use crate::model::{Model, SchemaCell};
use crate::session::SessionUser;
use crate::sql::{Field, ModelSchema};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MASKED_PASSWORD: &str = "******";

/// `<15-digit epoch millis><uuid hex>000`; sorts by creation time.
pub fn next_id() -> Value {
    Value::String(format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    ))
}

/// Current time as fractional epoch seconds.
pub fn epoch_now() -> Value {
    Value::from(Utc::now().timestamp_millis() as f64 / 1000.0)
}

fn id_field() -> Field {
    Field::string("id").primary_key().default_with(next_id).ddl("VARCHAR(50)")
}

fn created_at_field() -> Field {
    Field::float("created_at").default_with(epoch_now)
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub passwd: String,
    #[serde(default)]
    pub admin: bool,
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

static USER: SchemaCell = SchemaCell::new();

impl Model for User {
    fn schema() -> Result<&'static ModelSchema, OrmError> {
        Ok(USER.get_or_register(|| {
            ModelSchema::builder("User")
                .table("users")
                .field(id_field())
                .field(Field::string("email").ddl("VARCHAR(50)"))
                .field(Field::string("passwd").ddl("VARCHAR(64)"))
                .field(Field::boolean("admin"))
                .field(Field::string("name").ddl("VARCHAR(50)"))
                .field(Field::string("image").ddl("VARCHAR(500)"))
                .field(created_at_field())
                .build()
        })?)
    }
}

impl User {
    /// Copy safe to hand out: the password hash replaced by the mask.
    pub fn masked(&self) -> User {
        User {
            passwd: MASKED_PASSWORD.to_string(),
            ..self.clone()
        }
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
            admin: self.admin,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Blog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_image: String,
    pub name: String,
    pub summary: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

static BLOG: SchemaCell = SchemaCell::new();

impl Model for Blog {
    fn schema() -> Result<&'static ModelSchema, OrmError> {
        Ok(BLOG.get_or_register(|| {
            ModelSchema::builder("Blog")
                .table("blogs")
                .field(id_field())
                .field(Field::string("user_id").ddl("VARCHAR(50)"))
                .field(Field::string("user_name").ddl("VARCHAR(50)"))
                .field(Field::string("user_image").ddl("VARCHAR(500)"))
                .field(Field::string("name").ddl("VARCHAR(50)"))
                .field(Field::string("summary").ddl("VARCHAR(200)"))
                .field(Field::text("content"))
                .field(created_at_field())
                .build()
        })?)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub blog_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_image: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

static COMMENT: SchemaCell = SchemaCell::new();

impl Model for Comment {
    fn schema() -> Result<&'static ModelSchema, OrmError> {
        Ok(COMMENT.get_or_register(|| {
            ModelSchema::builder("Comment")
                .table("comments")
                .field(id_field())
                .field(Field::string("blog_id").ddl("VARCHAR(50)"))
                .field(Field::string("user_id").ddl("VARCHAR(50)"))
                .field(Field::string("user_name").ddl("VARCHAR(50)"))
                .field(Field::string("user_image").ddl("VARCHAR(500)"))
                .field(Field::text("content"))
                .field(created_at_field())
                .build()
        })?)
    }
}

/// Register every blog model; the schemas are returned for table bootstrap.
pub fn register_all() -> Result<Vec<&'static ModelSchema>, OrmError> {
    Ok(vec![User::schema()?, Blog::schema()?, Comment::schema()?])
}
