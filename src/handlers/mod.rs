//! Blog HTTP handlers and their route declarations.

pub mod blogs;
pub mod comments;
pub mod pages;
pub mod users;

use crate::error::{ApiError, AppError};
use crate::model::Model;
use crate::routes::{Call, Route};
use crate::session::SessionUser;
use crate::store::Database;

/// Every blog route, in registration order.
pub fn blog_routes() -> Vec<Route> {
    vec![
        Route::get("/").keyword_default("page").to(pages::index),
        Route::get("/register").to(pages::register),
        Route::get("/signin").to(pages::signin),
        Route::get("/signout").request().to(users::signout),
        Route::post("/api/users")
            .keyword("email")
            .keyword("name")
            .keyword("passwd")
            .to(users::api_register_user),
        Route::post("/api/authenticate")
            .keyword("email")
            .keyword("passwd")
            .to(users::authenticate),
        Route::get("/api/users").keyword_default("page").to(users::api_get_users),
        Route::get("/manage/blogs/create").to(pages::manage_create_blog),
        Route::get("/manage/blogs").keyword_default("page").to(pages::manage_blogs),
        Route::get("/manage/blogs/edit").keyword("id").to(pages::manage_edit_blog),
        Route::get("/manage/comments").keyword_default("page").to(pages::manage_comments),
        Route::get("/manage/users").keyword_default("page").to(pages::manage_users),
        Route::get("/api/blogs").keyword_default("page").to(blogs::api_blogs),
        Route::post("/api/blogs")
            .request()
            .keyword("name")
            .keyword("summary")
            .keyword("content")
            .to(blogs::api_create_blog),
        Route::get("/api/blogs/{id}").keyword("id").to(blogs::api_get_blog),
        Route::post("/api/blogs/{id}")
            .request()
            .keyword("id")
            .keyword("name")
            .keyword("summary")
            .keyword("content")
            .to(blogs::api_update_blog),
        Route::post("/api/blogs/{id}/delete")
            .request()
            .keyword("id")
            .to(blogs::api_delete_blog),
        Route::get("/api/comments").keyword_default("page").to(comments::api_comments),
        Route::post("/api/blogs/{id}/comments")
            .request()
            .keyword("id")
            .keyword("content")
            .to(comments::api_create_comment),
        Route::post("/api/comments/{id}/delete")
            .request()
            .keyword("id")
            .to(comments::api_delete_comment),
    ]
}

/// The current user, who must be an admin.
pub(crate) fn check_admin(call: &Call) -> Result<&SessionUser, ApiError> {
    match call.user() {
        Some(u) if u.admin => Ok(u),
        _ => Err(ApiError::permission("")),
    }
}

/// Trimmed value of a required text argument; blank is a value error on that field.
pub(crate) fn non_blank(call: &Call, field: &str) -> Result<String, AppError> {
    let value = call.required(field)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::value(field, format!("{field} cannot be empty.")).into());
    }
    Ok(value.to_string())
}

pub(crate) async fn count<M: Model>(db: &Database) -> Result<i64, AppError> {
    let n = M::find_number(db, "COUNT(id)", None, &[]).await?;
    Ok(n.and_then(|v| v.as_i64()).unwrap_or(0))
}
