//! Comment API.

use crate::blog::{page_index_from, Blog, Comment, Page};
use crate::error::{ApiError, AppError};
use crate::handlers::{check_admin, count};
use crate::model::Model;
use crate::response::Reply;
use crate::routes::Call;
use crate::sql::FindAll;
use serde_json::{json, Value};

pub async fn api_comments(call: Call) -> Result<Reply, AppError> {
    let page_index = page_index_from(&call.text_or("page", "1"));
    let db = &call.state.db;
    let num = count::<Comment>(db).await?;
    let page = Page::new(num, page_index);
    if num == 0 {
        return Reply::json(&json!({ "page": page, "comments": [] }));
    }
    let comments = Comment::find_all(db, FindAll::new().order_by("created_at").limit(page.query_limit())).await?;
    Reply::json(&json!({ "page": page, "comments": comments }))
}

pub async fn api_create_comment(call: Call) -> Result<Reply, AppError> {
    let Some(user) = call.user().cloned() else {
        return Err(ApiError::permission("Please signin first.").into());
    };
    let content = call.text("content").unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::value("content", "content cannot be empty.").into());
    }
    let id = call.required("id")?;
    let db = &call.state.db;
    let blog = Blog::find(db, Value::from(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found("Blog", format!("blog {id} not found")))?;
    let mut comment = Comment {
        blog_id: blog.id.unwrap_or(id),
        user_id: user.id,
        user_name: user.name,
        user_image: user.image,
        content: content.to_string(),
        ..Default::default()
    };
    comment.save(db).await?;
    Reply::json(&comment)
}

pub async fn api_delete_comment(call: Call) -> Result<Reply, AppError> {
    check_admin(&call)?;
    let id = call.required("id")?;
    let db = &call.state.db;
    let comment = Comment::find(db, Value::from(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found("Comment", format!("comment {id} not found")))?;
    comment.remove(db).await?;
    Reply::json(&json!({ "id": id }))
}
