//! The blog application: entities, paging, and the session user directory.

pub mod directory;
pub mod models;
pub mod page;

pub use directory::DbUserDirectory;
pub use models::{next_id, register_all, Blog, Comment, User};
pub use page::{page_index_from, Page};
