//! Handler return values and their conversion into HTTP responses.

use crate::error::AppError;
use crate::session::SessionUser;
use crate::template::TemplateRenderer;
use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

const HTML: &str = "text/html;charset=utf-8";
const JSON: &str = "application/json;charset=utf-8";
const TEXT: &str = "text/plain;charset=utf-8";

/// Anything a handler may return. The normalizer picks the response shape from the variant.
pub enum Reply {
    /// Prebuilt response, passed through untouched.
    Response(Response),
    Bytes(Vec<u8>),
    /// HTML body, or a redirect when prefixed with `redirect:`.
    Text(String),
    /// JSON body, or a rendered page when it carries `__template__`.
    Map(Map<String, Value>),
    Status(u16),
    StatusMessage(u16, String),
    Other(Value),
}

impl Reply {
    /// Serialize any value; objects become `Map`.
    pub fn json<T: Serialize>(value: &T) -> Result<Reply, AppError> {
        let value = serde_json::to_value(value).map_err(crate::error::OrmError::from)?;
        Ok(Reply::from(value))
    }

    pub fn redirect(location: &str) -> Reply {
        Reply::Text(format!("redirect:{location}"))
    }

    /// Page render: `context` plus `__template__`.
    pub fn template(name: &str, context: Value) -> Reply {
        let mut map = match context {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        map.insert("__template__".into(), Value::String(name.to_string()));
        Reply::Map(map)
    }
}

impl From<Response> for Reply {
    fn from(r: Response) -> Self {
        Reply::Response(r)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Reply::Bytes(b)
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(m: Map<String, Value>) -> Self {
        Reply::Map(m)
    }
}

impl From<u16> for Reply {
    fn from(code: u16) -> Self {
        Reply::Status(code)
    }
}

impl From<(u16, String)> for Reply {
    fn from((code, message): (u16, String)) -> Self {
        Reply::StatusMessage(code, message)
    }
}

impl From<Value> for Reply {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(m) => Reply::Map(m),
            Value::String(s) => Reply::Text(s),
            other => Reply::Other(other),
        }
    }
}

fn with_type(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response {
    let mut resp = Response::new(body.into());
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

fn valid_status(code: u16) -> Option<StatusCode> {
    if (100..600).contains(&code) {
        StatusCode::from_u16(code).ok()
    } else {
        None
    }
}

fn plain(text: String) -> Response {
    with_type(StatusCode::OK, TEXT, text)
}

/// Turn a handler reply into the HTTP response.
pub fn normalize(reply: Reply, user: Option<&SessionUser>, templates: &dyn TemplateRenderer) -> Result<Response, AppError> {
    match reply {
        Reply::Response(r) => Ok(r),
        Reply::Bytes(b) => Ok(with_type(StatusCode::OK, "application/octet-stream", b)),
        Reply::Text(s) => match s.strip_prefix("redirect:") {
            Some(location) => {
                let location = HeaderValue::from_str(location)
                    .map_err(|_| AppError::BadRequest(format!("invalid redirect target: {location}")))?;
                Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
            }
            None => Ok(with_type(StatusCode::OK, HTML, s)),
        },
        Reply::Map(mut map) => match map.get("__template__").and_then(Value::as_str).map(str::to_string) {
            Some(name) => {
                let user = serde_json::to_value(user).map_err(crate::error::OrmError::from)?;
                map.insert("__user__".into(), user);
                let html = templates.render(&name, &Value::Object(map))?;
                Ok(with_type(StatusCode::OK, HTML, html))
            }
            None => {
                let body = serde_json::to_vec(&map).map_err(crate::error::OrmError::from)?;
                Ok(with_type(StatusCode::OK, JSON, body))
            }
        },
        Reply::Status(code) => Ok(match valid_status(code) {
            Some(status) => status.into_response(),
            None => plain(code.to_string()),
        }),
        Reply::StatusMessage(code, message) => Ok(match valid_status(code) {
            Some(status) => with_type(status, TEXT, message),
            None => plain(format!("({code}, {message})")),
        }),
        Reply::Other(v) => Ok(plain(v.to_string())),
    }
}
