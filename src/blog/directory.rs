//! Session user lookup backed by the `users` table.

use crate::blog::models::User;
use crate::error::AppError;
use crate::model::Model;
use crate::session::{Credentials, UserDirectory};
use crate::store::Database;
use async_trait::async_trait;
use serde_json::Value;

pub struct DbUserDirectory {
    db: Database,
}

impl DbUserDirectory {
    pub fn new(db: Database) -> Self {
        DbUserDirectory { db }
    }
}

#[async_trait]
impl UserDirectory for DbUserDirectory {
    async fn lookup(&self, uid: &str) -> Result<Option<Credentials>, AppError> {
        let user = User::find(&self.db, Value::String(uid.to_string())).await?;
        Ok(user.map(|u| Credentials {
            user: u.session_user(),
            passwd: u.passwd,
        }))
    }
}
