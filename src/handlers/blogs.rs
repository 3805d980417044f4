//! Blog post API.

use crate::blog::{page_index_from, Blog, Page};
use crate::error::{ApiError, AppError};
use crate::handlers::{check_admin, count, non_blank};
use crate::model::Model;
use crate::response::Reply;
use crate::routes::Call;
use crate::sql::FindAll;
use serde_json::{json, Value};

async fn find_blog(call: &Call, id: &str) -> Result<Blog, AppError> {
    Blog::find(&call.state.db, Value::from(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Blog", format!("blog {id} not found")).into())
}

pub async fn api_blogs(call: Call) -> Result<Reply, AppError> {
    let page_index = page_index_from(&call.text_or("page", "1"));
    let db = &call.state.db;
    let num = count::<Blog>(db).await?;
    let page = Page::new(num, page_index);
    if num == 0 {
        return Reply::json(&json!({ "page": page, "blogs": [] }));
    }
    let blogs = Blog::find_all(db, FindAll::new().order_by("created_at DESC").limit(page.query_limit())).await?;
    Reply::json(&json!({ "page": page, "blogs": blogs }))
}

pub async fn api_get_blog(call: Call) -> Result<Reply, AppError> {
    let id = call.required("id")?;
    tracing::debug!(id = %id, "api_get_blog");
    let blog = find_blog(&call, &id).await?;
    Reply::json(&blog)
}

pub async fn api_create_blog(call: Call) -> Result<Reply, AppError> {
    let user = check_admin(&call)?.clone();
    let name = non_blank(&call, "name")?;
    let summary = non_blank(&call, "summary")?;
    let content = non_blank(&call, "content")?;
    let mut blog = Blog {
        user_id: user.id,
        user_name: user.name,
        user_image: user.image,
        name,
        summary,
        content,
        ..Default::default()
    };
    blog.save(&call.state.db).await?;
    Reply::json(&blog)
}

pub async fn api_update_blog(call: Call) -> Result<Reply, AppError> {
    check_admin(&call)?;
    let id = call.required("id")?;
    let mut blog = find_blog(&call, &id).await?;
    blog.name = non_blank(&call, "name")?;
    blog.summary = non_blank(&call, "summary")?;
    blog.content = non_blank(&call, "content")?;
    blog.update(&call.state.db).await?;
    Reply::json(&blog)
}

pub async fn api_delete_blog(call: Call) -> Result<Reply, AppError> {
    check_admin(&call)?;
    let id = call.required("id")?;
    let blog = find_blog(&call, &id).await?;
    blog.remove(&call.state.db).await?;
    Reply::json(&json!({ "id": id }))
}
