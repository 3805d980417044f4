//! Request middleware: request logging and cookie authentication with the admin gate.

use crate::extractors::SessionToken;
use crate::session::{cookie_to_user, SessionUser};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated user for this request, `None` when anonymous. Stored in request extensions.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

pub async fn log_requests(request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "request");
    next.run(request).await
}

/// Resolve the session cookie into `CurrentUser`; `/manage/` requires an admin.
pub async fn authenticate(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    mut request: Request,
    next: Next,
) -> Response {
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "check user");
    let mut user = None;
    if let Some(token) = token {
        let now = chrono::Utc::now().timestamp();
        user = cookie_to_user(state.users.as_ref(), &token, &state.session.secret, now).await;
        if let Some(u) = &user {
            tracing::info!(email = %u.email, "set current user");
        }
    }
    let is_admin = user.as_ref().is_some_and(|u| u.admin);
    if request.uri().path().starts_with("/manage/") && !is_admin {
        return (StatusCode::FOUND, [(header::LOCATION, "/signin")]).into_response();
    }
    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
