//! Signed session cookie: `<uid>-<expires>-<sha256 hex>`.
//!
//! The digest covers the uid, the stored password hash, the expiry and the server secret,
//! so changing a password invalidates every outstanding cookie for that user.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Written on sign-out together with `Max-Age=0`.
pub const DELETED_COOKIE: &str = "-deleted-";

/// The authenticated user as seen by handlers and templates. Never carries the password.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub admin: bool,
}

/// A user plus the stored password hash the cookie digest is checked against.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: SessionUser,
    pub passwd: String,
}

/// Source of users for cookie validation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, uid: &str) -> Result<Option<Credentials>, AppError>;
}

pub fn lowercase_sha256(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

fn cookie_digest(uid: &str, passwd: &str, expires: i64, secret: &str) -> String {
    lowercase_sha256(&format!("{uid}-{passwd}-{expires}-{secret}"))
}

/// Cookie value valid for `max_age` seconds from `now`.
pub fn user_to_cookie(uid: &str, passwd: &str, max_age: i64, secret: &str, now: i64) -> String {
    let expires = now + max_age;
    format!("{uid}-{expires}-{}", cookie_digest(uid, passwd, expires, secret))
}

/// Split a cookie value into uid, expiry and digest. `None` unless it has exactly three parts.
pub fn parse_cookie(value: &str) -> Option<(&str, &str, &str)> {
    let mut parts = value.split('-');
    let uid = parts.next()?;
    let expires = parts.next()?;
    let digest = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((uid, expires, digest))
}

/// Resolve a cookie to its user. Every failure (format, expiry, unknown user, digest,
/// directory error) yields `None`.
pub async fn cookie_to_user(dir: &dyn UserDirectory, cookie: &str, secret: &str, now: i64) -> Option<SessionUser> {
    if cookie.is_empty() {
        return None;
    }
    let (uid, expires, digest) = parse_cookie(cookie)?;
    let expires: i64 = expires.parse().ok()?;
    if expires < now {
        return None;
    }
    let creds = match dir.lookup(uid).await {
        Ok(Some(creds)) => creds,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, "session user lookup failed");
            return None;
        }
    };
    if digest != cookie_digest(uid, &creds.passwd, expires, secret) {
        tracing::info!(uid = %uid, "invalid session digest");
        return None;
    }
    Some(creds.user)
}

/// `Set-Cookie` header value for the session cookie.
pub fn set_cookie_header(name: &str, value: &str, max_age: i64) -> String {
    format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly")
}

/// Value of cookie `name` from a `Cookie` request header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneUser;

    #[async_trait]
    impl UserDirectory for OneUser {
        async fn lookup(&self, uid: &str) -> Result<Option<Credentials>, AppError> {
            if uid != "u1" {
                return Ok(None);
            }
            Ok(Some(Credentials {
                user: SessionUser {
                    id: "u1".into(),
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                    image: String::new(),
                    admin: true,
                },
                passwd: "hash".into(),
            }))
        }
    }

    const NOW: i64 = 1_700_000_000;

    #[tokio::test]
    async fn fresh_cookie_resolves_to_user() {
        let cookie = user_to_cookie("u1", "hash", 86400, "secret", NOW);
        let user = cookie_to_user(&OneUser, &cookie, "secret", NOW + 10).await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(user.admin);
    }

    #[tokio::test]
    async fn expired_cookie_is_rejected() {
        let cookie = user_to_cookie("u1", "hash", 60, "secret", NOW);
        assert!(cookie_to_user(&OneUser, &cookie, "secret", NOW + 61).await.is_none());
    }

    #[tokio::test]
    async fn altered_digest_is_rejected() {
        let cookie = user_to_cookie("u1", "hash", 60, "secret", NOW);
        let last = cookie.chars().last().unwrap();
        let flipped = if last == '0' { '1' } else { '0' };
        let tampered = format!("{}{}", &cookie[..cookie.len() - 1], flipped);
        assert!(cookie_to_user(&OneUser, &tampered, "secret", NOW).await.is_none());
    }

    #[tokio::test]
    async fn wrong_secret_unknown_user_and_malformed_are_rejected() {
        let cookie = user_to_cookie("u1", "hash", 60, "secret", NOW);
        assert!(cookie_to_user(&OneUser, &cookie, "other", NOW).await.is_none());
        let stranger = user_to_cookie("u2", "hash", 60, "secret", NOW);
        assert!(cookie_to_user(&OneUser, &stranger, "secret", NOW).await.is_none());
        assert!(cookie_to_user(&OneUser, DELETED_COOKIE, "secret", NOW).await.is_none());
        assert!(cookie_to_user(&OneUser, "u1-soon-abc", "secret", NOW).await.is_none());
        assert!(cookie_to_user(&OneUser, "", "secret", NOW).await.is_none());
    }

    #[test]
    fn cookie_header_lookup() {
        let header = "theme=dark; awesession=u1-1-ab; other=x";
        assert_eq!(cookie_value(header, "awesession"), Some("u1-1-ab"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let d = lowercase_sha256("abc");
        assert_eq!(d, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
