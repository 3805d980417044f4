//! Route declarations and the table that turns them into an axum router.

use crate::error::{AppError, RouteError};
use crate::response::Reply;
use crate::routes::dispatch::{BoxHandler, Call, Dispatcher, HandlerFuture};
use crate::routes::signature::Signature;
use crate::state::AppState;
use axum::{
    extract::{RawPathParams, Request, State},
    http::Method,
    routing::MethodRouter,
    Router,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

/// Method, path pattern and parameter declaration, before a handler is attached.
pub struct RouteBuilder {
    method: Method,
    path: String,
    signature: Signature,
}

/// A fully declared route.
pub struct Route {
    method: Method,
    path: String,
    signature: Signature,
    handler: BoxHandler,
}

impl Route {
    pub fn get(path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::GET, path)
    }

    pub fn post(path: &str) -> RouteBuilder {
        RouteBuilder::new(Method::POST, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RouteBuilder {
    fn new(method: Method, path: &str) -> Self {
        RouteBuilder {
            method,
            path: path.to_string(),
            signature: Signature::new(),
        }
    }

    pub fn request(mut self) -> Self {
        self.signature = self.signature.request();
        self
    }

    pub fn positional(mut self, name: &str) -> Self {
        self.signature = self.signature.positional(name);
        self
    }

    pub fn var_positional(mut self, name: &str) -> Self {
        self.signature = self.signature.var_positional(name);
        self
    }

    pub fn keyword(mut self, name: &str) -> Self {
        self.signature = self.signature.keyword(name);
        self
    }

    pub fn keyword_default(mut self, name: &str) -> Self {
        self.signature = self.signature.keyword_default(name);
        self
    }

    pub fn var_keyword(mut self, name: &str) -> Self {
        self.signature = self.signature.var_keyword(name);
        self
    }

    pub fn to<F, Fut, R>(self, handler: F) -> Route
    where
        F: Fn(Call) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, AppError>> + Send + 'static,
        R: Into<Reply>,
    {
        let handler: BoxHandler = Arc::new(move |call: Call| -> HandlerFuture {
            let fut = handler(call);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Route {
            method: self.method,
            path: self.path,
            signature: self.signature,
            handler,
        }
    }
}

/// Convert `{name}` segments into axum's `:name` form.
pub fn axum_path(pattern: &str) -> Result<String, RouteError> {
    let invalid = || RouteError::InvalidPattern(pattern.to_string());
    if !pattern.starts_with('/') {
        return Err(invalid());
    }
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let (head, tail) = rest.split_at(open);
        if head.contains('}') {
            return Err(invalid());
        }
        out.push_str(head);
        let close = tail.find('}').ok_or_else(invalid)?;
        let name = &tail[1..close];
        let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(invalid());
        }
        out.push(':');
        out.push_str(name);
        rest = &tail[close + 1..];
    }
    if rest.contains('}') {
        return Err(invalid());
    }
    out.push_str(rest);
    Ok(out)
}

/// Registration table: one dispatcher per (method, path).
#[derive(Default)]
pub struct Routes {
    entries: Vec<(String, Dispatcher)>,
    seen: HashSet<(Method, String)>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) -> Result<(), RouteError> {
        let spec = route.signature.inspect(&route.path)?;
        let path = axum_path(&route.path)?;
        if !self.seen.insert((route.method.clone(), path.clone())) {
            return Err(RouteError::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path,
            });
        }
        tracing::info!(
            method = %route.method,
            path = %route.path,
            params = ?route.signature.names(),
            "add route"
        );
        self.entries.push((
            path,
            Dispatcher {
                method: route.method,
                path: route.path,
                spec,
                handler: route.handler,
            },
        ));
        Ok(())
    }

    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = Route>) -> Result<(), RouteError> {
        for route in routes {
            self.add(route)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_router(self) -> Router<AppState> {
        let mut order: Vec<String> = Vec::new();
        let mut by_path: HashMap<String, MethodRouter<AppState>> = HashMap::new();
        for (path, dispatcher) in self.entries {
            let is_post = dispatcher.method == Method::POST;
            let dispatcher = Arc::new(dispatcher);
            let handler = move |State(state): State<AppState>, params: Option<RawPathParams>, request: Request| {
                let dispatcher = dispatcher.clone();
                async move {
                    let params: Vec<(String, String)> = params
                        .map(|p| p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
                        .unwrap_or_default();
                    dispatcher.dispatch(state, params, request).await
                }
            };
            let entry = match by_path.remove(&path) {
                Some(existing) => existing,
                None => {
                    order.push(path.clone());
                    MethodRouter::new()
                }
            };
            let entry = if is_post { entry.post(handler) } else { entry.get(handler) };
            by_path.insert(path, entry);
        }
        let mut router = Router::new();
        for path in order {
            if let Some(methods) = by_path.remove(&path) {
                router = router.route(&path, methods);
            }
        }
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_call: Call) -> Result<Reply, AppError> {
        Ok(Reply::Status(204))
    }

    #[test]
    fn path_patterns_convert_to_axum_form() {
        assert_eq!(axum_path("/api/blogs/{id}").unwrap(), "/api/blogs/:id");
        assert_eq!(axum_path("/api/blogs/{id}/comments").unwrap(), "/api/blogs/:id/comments");
        assert_eq!(axum_path("/").unwrap(), "/");
        assert!(axum_path("api").is_err());
        assert!(axum_path("/a/{").is_err());
        assert!(axum_path("/a/{1x}").is_err());
        assert!(axum_path("/a/}").is_err());
    }

    #[test]
    fn duplicate_method_and_path_is_rejected() {
        let mut routes = Routes::new();
        routes.add(Route::get("/api/blogs").to(noop)).unwrap();
        routes.add(Route::post("/api/blogs").to(noop)).unwrap();
        let err = routes.add(Route::get("/api/blogs").to(noop)).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn bad_signature_fails_registration() {
        let mut routes = Routes::new();
        let err = routes
            .add(Route::get("/").request().positional("page").to(noop))
            .unwrap_err();
        assert!(matches!(err, RouteError::RequestParamNotLast { .. }));
        assert!(routes.is_empty());
    }
}
