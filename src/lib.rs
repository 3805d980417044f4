//! Blog CMS backend: a signature-driven request dispatcher and a schema-derived ORM over
//! PostgreSQL, with the blog application built on both.

pub mod blog;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod response;
pub mod routes;
pub mod session;
pub mod sql;
pub mod state;
pub mod store;
pub mod template;

pub use blog::{register_all, Blog, Comment, DbUserDirectory, User};
pub use config::{AppConfig, DbConfig, ServerConfig, SessionConfig};
pub use error::{ApiError, AppError, ConfigError, OrmError, RouteError, SchemaError};
pub use handlers::blog_routes;
pub use model::{Model, Record, SchemaCell};
pub use response::Reply;
pub use routes::{app, Call, Route, Routes};
pub use session::{SessionUser, UserDirectory};
pub use sql::{Field, FindAll, Limit, ModelSchema};
pub use state::AppState;
pub use store::Database;
pub use template::{MiniJinjaRenderer, TemplateRenderer};
