//! Registration, sign-in, sign-out and the user listing.

use crate::blog::{next_id, page_index_from, Page, User};
use crate::error::{ApiError, AppError};
use crate::handlers::count;
use crate::model::Model;
use crate::response::Reply;
use crate::routes::Call;
use crate::session::{lowercase_sha256, set_cookie_header, user_to_cookie, DELETED_COOKIE};
use crate::sql::FindAll;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9.\-_]+@[a-z0-9\-_]+(\.[a-z0-9\-_]+){1,4}$").expect("email regex should be valid")
});

/// Client-side digest of the password: 64 lowercase hex characters.
static PASSWD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("password digest regex should be valid"));

/// Stored form of the client digest, salted with the user id.
pub fn password_hash(uid: &str, client_digest: &str) -> String {
    lowercase_sha256(&format!("{uid}:{client_digest}"))
}

fn gravatar(email: &str) -> String {
    format!(
        "https://www.gravatar.com/avatar/{}?d=mm&s=120",
        lowercase_sha256(&email.trim().to_lowercase())
    )
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|e| AppError::Internal(format!("invalid header value: {e}")))
}

/// Masked user as JSON with a fresh session cookie.
fn signed_in(call: &Call, user: &User) -> Result<Response, AppError> {
    let session = &call.state.session;
    let uid = user.id.clone().unwrap_or_default();
    let now = chrono::Utc::now().timestamp();
    let cookie = user_to_cookie(&uid, &user.passwd, session.max_age, &session.secret, now);
    let mut resp = Json(user.masked()).into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        header_value(&set_cookie_header(&session.cookie_name, &cookie, session.max_age))?,
    );
    Ok(resp)
}

pub async fn api_register_user(call: Call) -> Result<Reply, AppError> {
    let name = call.text("name").unwrap_or_default();
    let email = call.text("email").unwrap_or_default();
    let passwd = call.text("passwd").unwrap_or_default();
    if name.trim().is_empty() {
        return Err(ApiError::value("name", "Invalid name.").into());
    }
    if email.is_empty() || !EMAIL_RE.is_match(&email) {
        return Err(ApiError::value("email", "Invalid email.").into());
    }
    if passwd.is_empty() || !PASSWD_RE.is_match(&passwd) {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    let db = &call.state.db;
    let existing = User::find_all(db, FindAll::new().filter("email = ?", vec![Value::from(email.as_str())])).await?;
    if !existing.is_empty() {
        return Err(ApiError::new("register:failed", "email", "Email is already in use.").into());
    }
    let uid = match next_id() {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let mut user = User {
        passwd: password_hash(&uid, &passwd),
        id: Some(uid),
        name: name.trim().to_string(),
        image: gravatar(&email),
        email,
        ..Default::default()
    };
    user.save(db).await?;
    tracing::info!(email = %user.email, "user registered");
    Ok(signed_in(&call, &user)?.into())
}

pub async fn authenticate(call: Call) -> Result<Reply, AppError> {
    let email = call.text("email").unwrap_or_default();
    let passwd = call.text("passwd").unwrap_or_default();
    if email.is_empty() {
        return Err(ApiError::value("email", "Invalid email.").into());
    }
    if passwd.is_empty() {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    let users = User::find_all(&call.state.db, FindAll::new().filter("email = ?", vec![Value::from(email)])).await?;
    let Some(user) = users.into_iter().next() else {
        return Err(ApiError::value("email", "Email not exist.").into());
    };
    let uid = user.id.clone().unwrap_or_default();
    if user.passwd != password_hash(&uid, &passwd) {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    Ok(signed_in(&call, &user)?.into())
}

/// Clear the cookie and go back where the user came from.
pub async fn signout(call: Call) -> Result<Reply, AppError> {
    let target = call.header("referer").unwrap_or("/").to_string();
    let cookie = set_cookie_header(&call.state.session.cookie_name, DELETED_COOKIE, 0);
    let resp = (
        StatusCode::FOUND,
        [
            (header::LOCATION, header_value(&target)?),
            (header::SET_COOKIE, header_value(&cookie)?),
        ],
    )
        .into_response();
    tracing::info!("user signed out");
    Ok(resp.into())
}

pub async fn api_get_users(call: Call) -> Result<Reply, AppError> {
    let page_index = page_index_from(&call.text_or("page", "1"));
    let db = &call.state.db;
    let num = count::<User>(db).await?;
    let page = Page::new(num, page_index);
    if num == 0 {
        return Reply::json(&json!({ "page": page, "users": [] }));
    }
    let users: Vec<User> = User::find_all(db, FindAll::new().order_by("created_at DESC").limit(page.query_limit()))
        .await?
        .iter()
        .map(User::masked)
        .collect();
    Reply::json(&json!({ "page": page, "users": users }))
}
