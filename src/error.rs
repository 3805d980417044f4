//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Model registration failures. Raised when a schema is built, never when it is used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("primary key not found for model {0}")]
    MissingPrimaryKey(String),
    #[error("duplicate primary key for field: {0}")]
    DuplicatePrimaryKey(String),
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    #[error("field {0} cannot be a primary key")]
    InvalidPrimaryKey(String),
}

#[derive(Error, Debug)]
pub enum OrmError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("record has no attribute '{0}'")]
    MissingAttribute(String),
    #[error("model {model} has no field '{field}'")]
    UnknownField { model: String, field: String },
    #[error("invalid limit value: {0}")]
    InvalidLimit(String),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("cannot decode column '{column}' of type {type_name}")]
    UnsupportedColumn { column: String, type_name: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("request parameter must be the last named parameter in {path}: found '{param}' after it")]
    RequestParamNotLast { path: String, param: String },
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),
}

/// Domain error raised by handlers; the dispatcher turns it into a JSON payload.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{error}: {message}")]
pub struct ApiError {
    pub error: String,
    pub data: String,
    pub message: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, data: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            error: error.into(),
            data: data.into(),
            message: message.into(),
        }
    }

    /// Bad or missing input; `data` names the field.
    pub fn value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new("value:invalid", field, message)
    }

    /// Referenced resource is absent; `data` names the resource.
    pub fn not_found(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new("value:notfound", resource, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new("permission:forbidden", "permission", message)
    }

    pub fn payload(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("error".into(), self.error.clone().into());
        map.insert("data".into(), self.data.clone().into());
        map.insert("message".into(), self.message.clone().into());
        map
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Orm(#[from] OrmError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("template: {0}")]
    Template(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Orm(OrmError::Db(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub data: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, data) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", String::new()),
            AppError::Api(e) => (StatusCode::BAD_REQUEST, e.error.as_str(), e.data.clone()),
            AppError::Orm(OrmError::Db(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", String::new()),
            AppError::Orm(_) => (StatusCode::INTERNAL_SERVER_ERROR, "orm_error", String::new()),
            AppError::Route(_) => (StatusCode::INTERNAL_SERVER_ERROR, "route_error", String::new()),
            AppError::MissingArgument(name) => (StatusCode::BAD_REQUEST, "value:missing", name.clone()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", String::new()),
            AppError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "template_error", String::new()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", String::new()),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: code.to_string(),
            data,
            message: match &self {
                AppError::Api(e) => e.message.clone(),
                other => other.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
