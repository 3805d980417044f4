//! Routing: handler signatures, the registration table, per-route dispatch, app assembly.

pub mod common;
pub mod dispatch;
pub mod registry;
pub mod signature;

pub use common::common_routes;
pub use dispatch::{Call, Kwargs, RequestContext, BODY_LIMIT};
pub use registry::{Route, RouteBuilder, Routes};
pub use signature::{ArgSpec, ParamKind, Signature};

use crate::middleware::{authenticate, log_requests};
use crate::state::AppState;
use axum::{middleware, Router};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

/// Declared routes plus common endpoints and `/static`, behind auth then request logging.
pub fn app(state: AppState, routes: Routes, static_dir: &str) -> Router {
    routes
        .into_router()
        .merge(common_routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn(log_requests))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .with_state(state)
}
