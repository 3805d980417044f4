//! Shared application state for all routes. Built once at startup.

use crate::config::SessionConfig;
use crate::session::UserDirectory;
use crate::store::Database;
use crate::template::TemplateRenderer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub templates: Arc<dyn TemplateRenderer>,
    /// Resolves session cookies to users.
    pub users: Arc<dyn UserDirectory>,
    pub session: Arc<SessionConfig>,
}
