//! Blog server: loads config, opens the pool, creates tables, serves the blog routes.
//!
//! Run from repo root: `cargo run -p blog-server`

use blog_cms::{
    app, blog_routes, register_all, AppConfig, AppState, Database, DbUserDirectory, MiniJinjaRenderer, Routes,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blog_cms=info")),
        )
        .init();

    let db = Database::connect(&config.db).await?;
    let schemas = register_all()?;
    db.ensure_tables(&schemas).await?;

    let state = AppState {
        db: db.clone(),
        templates: Arc::new(MiniJinjaRenderer::new(&config.server.template_dir)),
        users: Arc::new(DbUserDirectory::new(db.clone())),
        session: Arc::new(config.session.clone()),
    };
    let mut routes = Routes::new();
    routes.add_routes(blog_routes())?;
    let router = app(state, routes, &config.server.static_dir);

    let listener = TcpListener::bind(&config.server.bind).await?;
    tracing::info!("server started at http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    db.close().await;
    Ok(())
}
