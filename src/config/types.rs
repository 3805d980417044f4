//! Runtime configuration: database pool, session cookie, HTTP server.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_true")]
    pub autocommit: bool,
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default = "default_min_size")]
    pub min_size: u32,
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    5432
}

fn default_charset() -> String {
    "utf8".into()
}

fn default_true() -> bool {
    true
}

fn default_max_size() -> u32 {
    10
}

fn default_min_size() -> u32 {
    1
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            host: default_host(),
            port: default_port(),
            user: "www-data".into(),
            password: "www-data".into(),
            database: "awesome".into(),
            charset: default_charset(),
            autocommit: true,
            max_size: default_max_size(),
            min_size: default_min_size(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: String,
    /// Cookie lifetime in seconds.
    pub max_age: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: "awesession".into(),
            secret: "Awesome".into(),
            max_age: 86400,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub template_dir: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:9000".into(),
            template_dir: "templates".into(),
            static_dir: "static".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}
