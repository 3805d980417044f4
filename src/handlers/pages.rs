//! HTML pages.

use crate::blog::{page_index_from, Blog, Page};
use crate::error::AppError;
use crate::handlers::count;
use crate::model::Model;
use crate::response::Reply;
use crate::routes::Call;
use crate::sql::FindAll;
use serde_json::json;

pub async fn index(call: Call) -> Result<Reply, AppError> {
    let page_index = page_index_from(&call.text_or("page", "1"));
    let db = &call.state.db;
    let num = count::<Blog>(db).await?;
    let page = Page::new(num, page_index);
    let blogs = if num == 0 {
        Vec::new()
    } else {
        Blog::find_all(db, FindAll::new().order_by("created_at DESC").limit(page.query_limit())).await?
    };
    Ok(Reply::template("blogs.html", json!({ "page": page, "blogs": blogs })))
}

pub async fn register(_call: Call) -> Result<Reply, AppError> {
    Ok(Reply::template("register.html", json!({})))
}

pub async fn signin(_call: Call) -> Result<Reply, AppError> {
    Ok(Reply::template("signin.html", json!({})))
}

pub async fn manage_create_blog(_call: Call) -> Result<Reply, AppError> {
    Ok(Reply::template(
        "manage_blog_edit.html",
        json!({ "id": "", "action": "/api/blogs" }),
    ))
}

pub async fn manage_edit_blog(call: Call) -> Result<Reply, AppError> {
    let id = call.required("id")?;
    Ok(Reply::template(
        "manage_blog_edit.html",
        json!({ "id": id, "action": format!("/api/blogs/{id}") }),
    ))
}

fn listing(call: &Call, template: &str) -> Reply {
    let page_index = page_index_from(&call.text_or("page", "1"));
    Reply::template(template, json!({ "page_index": page_index }))
}

pub async fn manage_blogs(call: Call) -> Result<Reply, AppError> {
    Ok(listing(&call, "manage_blogs.html"))
}

pub async fn manage_comments(call: Call) -> Result<Reply, AppError> {
    Ok(listing(&call, "manage_comments.html"))
}

pub async fn manage_users(call: Call) -> Result<Reply, AppError> {
    Ok(listing(&call, "manage_users.html"))
}
