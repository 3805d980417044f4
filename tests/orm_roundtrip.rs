//! Round-trip tests against a live PostgreSQL instance.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use blog_cms::{register_all, Blog, Comment, Database, FindAll, Limit, Model, OrmError};
use serde_json::Value;

async fn database() -> Database {
    connect(true).await
}

async fn connect(autocommit: bool) -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    let db = Database::from_pool(pool, autocommit);
    db.ensure_tables(&register_all().unwrap()).await.unwrap();
    db
}

fn blog(name: &str) -> Blog {
    Blog {
        user_id: "u-test".into(),
        user_name: "Tester".into(),
        user_image: String::new(),
        name: name.into(),
        summary: "summary".into(),
        content: "content".into(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_save_then_find_round_trips_with_defaults() {
    let db = database().await;
    let mut b = blog("round-trip");
    assert!(b.id.is_none());
    b.save(&db).await.unwrap();

    let id = b.id.clone().unwrap();
    let created_at = b.created_at.unwrap();
    let found = Blog::find(&db, Value::from(id.as_str())).await.unwrap().unwrap();
    assert_eq!(found.name, "round-trip");
    assert_eq!(found.created_at, Some(created_at));

    b.remove(&db).await.unwrap();
    assert!(Blog::find(&db, Value::from(id)).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_update_writes_current_values() {
    let db = database().await;
    let mut b = blog("before");
    b.save(&db).await.unwrap();
    b.name = "after".into();
    b.update(&db).await.unwrap();

    let found = Blog::find(&db, Value::from(b.id.clone().unwrap())).await.unwrap().unwrap();
    assert_eq!(found.name, "after");
    b.remove(&db).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_find_all_limit_shapes_and_count() {
    let db = database().await;
    let mut saved = Vec::new();
    for i in 0..3 {
        let mut c = Comment {
            blog_id: "limit-shapes".into(),
            user_id: "u-test".into(),
            user_name: "Tester".into(),
            user_image: String::new(),
            content: format!("c{i}"),
            ..Default::default()
        };
        c.save(&db).await.unwrap();
        saved.push(c);
    }
    let filter = || FindAll::new().filter("blog_id = ?", vec![Value::from("limit-shapes")]).order_by("content");

    let two = Comment::find_all(&db, filter().limit(Limit::Count(2))).await.unwrap();
    assert_eq!(two.len(), 2);

    let tail = Comment::find_all(&db, filter().limit(Limit::Range { offset: 1, count: 5 })).await.unwrap();
    let contents: Vec<&str> = tail.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["c1", "c2"]);

    let n = Comment::find_number(&db, "COUNT(id)", Some("blog_id = ?"), &[Value::from("limit-shapes")])
        .await
        .unwrap();
    assert_eq!(n.and_then(|v| v.as_i64()), Some(3));

    for c in &saved {
        c.remove(&db).await.unwrap();
    }
}

#[tokio::test]
#[ignore]
async fn test_find_number_decodes_numeric_aggregates() {
    let db = database().await;
    let mut b = blog("abc");
    b.save(&db).await.unwrap();
    let id = Value::from(b.id.clone().unwrap());

    let avg = Blog::find_number(&db, "AVG(LENGTH(name))", Some("id = ?"), &[id.clone()])
        .await
        .unwrap();
    assert_eq!(avg.and_then(|v| v.as_i64()), Some(3));

    let half = Blog::find_number(&db, "AVG(LENGTH(name)) / 2", Some("id = ?"), &[id])
        .await
        .unwrap();
    assert_eq!(half.and_then(|v| v.as_f64()), Some(1.5));

    b.remove(&db).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_select_rejects_undecodable_columns() {
    let db = database().await;
    let err = db.select("SELECT INTERVAL '1 day' AS span", &[], None).await.unwrap_err();
    assert!(matches!(err, OrmError::UnsupportedColumn { ref column, .. } if column == "span"));
}

#[tokio::test]
#[ignore]
async fn test_transactional_write_rolls_back_on_failure_and_commits_on_success() {
    let db = connect(false).await;
    assert!(!db.autocommit());

    let mut first = blog("tx-first");
    first.save(&db).await.unwrap();
    let id = first.id.clone().unwrap();

    let mut duplicate = blog("tx-duplicate");
    duplicate.id = Some(id.clone());
    let err = duplicate.save(&db).await.unwrap_err();
    assert!(matches!(err, OrmError::Db(_)));

    let count = |name: &'static str| {
        let db = db.clone();
        async move {
            Blog::find_number(&db, "COUNT(id)", Some("name = ?"), &[Value::from(name)])
                .await
                .unwrap()
                .and_then(|v| v.as_i64())
        }
    };
    assert_eq!(count("tx-duplicate").await, Some(0));
    assert_eq!(count("tx-first").await, Some(1));

    let mut second = blog("tx-second");
    second.save(&db).await.unwrap();
    assert_eq!(count("tx-second").await, Some(1));

    first.remove(&db).await.unwrap();
    second.remove(&db).await.unwrap();
    assert!(Blog::find(&db, Value::from(id)).await.unwrap().is_none());
}
