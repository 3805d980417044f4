//! Per-route dispatcher: builds the handler's keyword arguments from the request
//! according to its `ArgSpec`, calls it, and normalizes the reply.

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::response::{normalize, Reply};
use crate::routes::signature::ArgSpec;
use crate::session::SessionUser;
use crate::state::AppState;
use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;

/// Upper bound for buffered request bodies.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Keyword arguments handed to a handler.
pub type Kwargs = Map<String, Value>;

pub type HandlerFuture = BoxFuture<'static, Result<Reply, AppError>>;
pub type BoxHandler = Arc<dyn Fn(Call) -> HandlerFuture + Send + Sync>;

/// What a handler sees of the request when it declares a request parameter.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub user: Option<SessionUser>,
}

/// One handler invocation.
pub struct Call {
    pub state: AppState,
    pub request: Option<RequestContext>,
    pub args: Kwargs,
}

impl Call {
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Argument as text; numbers and booleans are rendered, null counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.args.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn text_or(&self, name: &str, default: &str) -> String {
        self.text(name).unwrap_or_else(|| default.to_string())
    }

    /// Required argument; the dispatcher has already checked presence, so absence is a
    /// registration mistake and reported as a missing argument.
    pub fn required(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::MissingArgument(name.to_string()))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.request.as_ref().and_then(|r| r.user.as_ref())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.headers.get(name))
            .and_then(|v| v.to_str().ok())
    }
}

pub struct Dispatcher {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) spec: ArgSpec,
    pub(crate) handler: BoxHandler,
}

impl Dispatcher {
    pub fn spec(&self) -> &ArgSpec {
        &self.spec
    }

    pub async fn dispatch(&self, state: AppState, path_params: Vec<(String, String)>, request: Request) -> Response {
        match self.run(state, path_params, request).await {
            Ok(resp) => resp,
            Err(e) => e.into_response(),
        }
    }

    async fn run(&self, state: AppState, path_params: Vec<(String, String)>, request: Request) -> Result<Response, AppError> {
        let user = request
            .extensions()
            .get::<CurrentUser>()
            .and_then(|c| c.0.clone());
        let context = self.spec.has_request_arg.then(|| RequestContext {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            user: user.clone(),
        });

        let mut kw: Option<Kwargs> = None;
        if self.spec.reads_input() {
            if *request.method() == Method::POST {
                kw = Some(parse_body(request, &state).await?);
            } else if *request.method() == Method::GET {
                kw = parse_query(request.uri().query());
            }
        }

        let path: Kwargs = path_params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let args = match kw {
            None => path,
            Some(mut kw) => {
                if !self.spec.has_var_kw_arg && self.spec.has_named_kw_args() {
                    kw.retain(|k, _| self.spec.named_kw_args.iter().any(|n| n == k));
                }
                for (k, v) in path {
                    if kw.contains_key(&k) {
                        tracing::warn!(arg = %k, "duplicate arg name in named arg and kw args");
                    }
                    kw.insert(k, v);
                }
                kw
            }
        };

        if let Some(missing) = self.spec.required_kw_args.iter().find(|n| !args.contains_key(n.as_str())) {
            return Err(AppError::MissingArgument(missing.clone()));
        }

        tracing::info!(method = %self.method, path = %self.path, args = ?args.keys().collect::<Vec<_>>(), "call handler");
        let call = Call {
            state: state.clone(),
            request: context,
            args,
        };
        let reply = match (self.handler)(call).await {
            Ok(reply) => reply,
            Err(AppError::Api(e)) => Reply::Map(e.payload()),
            Err(e) => return Err(e),
        };
        normalize(reply, user.as_ref(), state.templates.as_ref())
    }
}

fn first_wins<'a>(pairs: impl Iterator<Item = (Cow<'a, str>, Cow<'a, str>)>) -> Kwargs {
    let mut kw = Kwargs::new();
    for (k, v) in pairs {
        kw.entry(k.into_owned())
            .or_insert_with(|| Value::String(v.into_owned()));
    }
    kw
}

/// Query string as keyword arguments; an empty query gives no map at all.
fn parse_query(query: Option<&str>) -> Option<Kwargs> {
    let query = query.filter(|q| !q.is_empty())?;
    Some(first_wins(url::form_urlencoded::parse(query.as_bytes())))
}

async fn parse_body(request: Request, state: &AppState) -> Result<Kwargs, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .filter(|ct| !ct.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type.".into()))?;

    if content_type.starts_with("application/json") {
        let bytes = to_bytes(request.into_body(), BODY_LIMIT)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::BadRequest("JSON body must be object.".into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {e}"))),
        };
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = to_bytes(request.into_body(), BODY_LIMIT)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(first_wins(url::form_urlencoded::parse(&bytes)));
    }
    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let mut kw = Kwargs::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            kw.entry(name).or_insert(Value::String(text));
        }
        return Ok(kw);
    }
    Err(AppError::BadRequest(format!("Unsupported Content-Type: {content_type}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_gives_no_map() {
        assert!(parse_query(None).is_none());
        assert!(parse_query(Some("")).is_none());
    }

    #[test]
    fn query_keeps_first_value_and_blanks() {
        let kw = parse_query(Some("page=2&page=9&q=&tag=a%20b")).unwrap();
        assert_eq!(kw["page"], "2");
        assert_eq!(kw["q"], "");
        assert_eq!(kw["tag"], "a b");
    }
}
