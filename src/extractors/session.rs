//! Extract the session cookie value from the `Cookie` header.

use crate::session::cookie_value;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// Raw session cookie, if the request carries one under the configured name.
#[derive(Clone, Debug)]
pub struct SessionToken(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|h| cookie_value(h, &state.session.cookie_name))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(SessionToken(value))
    }
}
