//! Load config: built-in defaults, overridden per key from the environment (and `.env`).

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use std::str::FromStr;

impl AppConfig {
    /// Defaults overridden by `BLOG_*` environment variables; reads `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::Load(e.to_string()));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads overrides through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut c = AppConfig::default();
        override_str(&lookup, "BLOG_DB_HOST", &mut c.db.host);
        override_parsed(&lookup, "BLOG_DB_PORT", &mut c.db.port)?;
        override_str(&lookup, "BLOG_DB_USER", &mut c.db.user);
        override_str(&lookup, "BLOG_DB_PASSWORD", &mut c.db.password);
        override_str(&lookup, "BLOG_DB_NAME", &mut c.db.database);
        override_str(&lookup, "BLOG_DB_CHARSET", &mut c.db.charset);
        override_parsed(&lookup, "BLOG_DB_AUTOCOMMIT", &mut c.db.autocommit)?;
        override_parsed(&lookup, "BLOG_DB_MAX_SIZE", &mut c.db.max_size)?;
        override_parsed(&lookup, "BLOG_DB_MIN_SIZE", &mut c.db.min_size)?;
        override_str(&lookup, "BLOG_SESSION_COOKIE", &mut c.session.cookie_name);
        override_str(&lookup, "BLOG_SESSION_SECRET", &mut c.session.secret);
        override_parsed(&lookup, "BLOG_SESSION_MAX_AGE", &mut c.session.max_age)?;
        override_str(&lookup, "BLOG_BIND", &mut c.server.bind);
        override_str(&lookup, "BLOG_TEMPLATE_DIR", &mut c.server.template_dir);
        override_str(&lookup, "BLOG_STATIC_DIR", &mut c.server.static_dir);
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db.max_size == 0 {
            return Err(ConfigError::Validation("db max_size must be at least 1".into()));
        }
        if self.db.min_size > self.db.max_size {
            return Err(ConfigError::Validation(format!(
                "db min_size {} exceeds max_size {}",
                self.db.min_size, self.db.max_size
            )));
        }
        if self.session.secret.is_empty() {
            return Err(ConfigError::Validation("session secret must not be empty".into()));
        }
        Ok(())
    }
}

fn override_str<F>(lookup: &F, key: &str, slot: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(key) {
        *slot = v;
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(v) = lookup(key) {
        *slot = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v.clone(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_overrides() {
        let c = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.db.host, "localhost");
        assert_eq!(c.db.max_size, 10);
        assert!(c.db.autocommit);
        assert_eq!(c.session.max_age, 86400);
    }

    #[test]
    fn overrides_replace_single_keys() {
        let c = AppConfig::from_lookup(lookup(&[
            ("BLOG_DB_HOST", "db.internal"),
            ("BLOG_DB_PORT", "6543"),
            ("BLOG_DB_AUTOCOMMIT", "false"),
            ("BLOG_SESSION_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(c.db.host, "db.internal");
        assert_eq!(c.db.port, 6543);
        assert!(!c.db.autocommit);
        assert_eq!(c.session.secret, "s3cret");
        assert_eq!(c.db.database, "awesome");
    }

    #[test]
    fn bad_number_is_reported_with_its_key() {
        let err = AppConfig::from_lookup(lookup(&[("BLOG_DB_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BLOG_DB_PORT"));
    }

    #[test]
    fn pool_bounds_are_validated() {
        let err = AppConfig::from_lookup(lookup(&[("BLOG_DB_MIN_SIZE", "20")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
