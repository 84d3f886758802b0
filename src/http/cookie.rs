// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-host session cookie storage

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie as received in `Set-Cookie`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Path attribute, empty when the server sent none
    pub path: String,
    /// Domain attribute, empty when the server sent none
    pub domain: String,
    /// Expires attribute
    pub expires: Option<DateTime<Utc>>,
    /// Max-Age attribute in seconds
    pub max_age: Option<i64>,
    /// Secure flag
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
    /// SameSite attribute
    pub same_site: Option<SameSite>,
}

/// SameSite cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: String::new(),
            domain: String::new(),
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Whether `other` occupies the same slot in a host's list
    pub fn same_key(&self, other: &Cookie) -> bool {
        self.name == other.name && self.path == other.path
    }

    /// Parse a Set-Cookie header value.
    ///
    /// Attributes are recorded as sent. Returns `None` when the first
    /// pair has no `=` or an empty name.
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim().trim_matches('"');
        let mut cookie = Cookie::new(name, value);

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_lowercase().as_str() {
                    "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                    "path" => cookie.path = val.to_string(),
                    "expires" => {
                        cookie.expires = DateTime::parse_from_rfc2822(val)
                            .ok()
                            .map(|dt| dt.with_timezone(&Utc));
                    }
                    "max-age" => cookie.max_age = val.parse().ok(),
                    "samesite" => {
                        cookie.same_site = match val.to_lowercase().as_str() {
                            "strict" => Some(SameSite::Strict),
                            "lax" => Some(SameSite::Lax),
                            "none" => Some(SameSite::None),
                            _ => None,
                        };
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if !self.path.is_empty() {
            write!(f, "; Path={}", self.path)?;
        }
        if !self.domain.is_empty() {
            write!(f, "; Domain={}", self.domain)?;
        }
        if let Some(expires) = self.expires {
            write!(f, "; Expires={}", expires.to_rfc2822())?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// Key a URL files its cookies under: host, plus the port when it is not
/// the scheme default.
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Thread-safe session cookie storage, one list per host.
///
/// Cookies are never expired or path-matched; a host's list is replayed
/// whole. Within a host a `(name, path)` pair appears at most once.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    /// Cookies stored by host
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
    /// Log every cookie change at info level
    logging: bool,
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a jar that logs every cookie change
    pub fn with_logging(logging: bool) -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
            logging,
        }
    }

    /// Whether cookie changes are logged
    pub fn logging(&self) -> bool {
        self.logging
    }

    /// Merge cookies into a host's list.
    ///
    /// An existing cookie with the same name and path is replaced in
    /// place; anything else is appended. The whole merge holds the
    /// host's entry lock.
    pub fn set_cookies(&self, host: &str, new_cookies: impl IntoIterator<Item = Cookie>) {
        let mut existing = self.cookies.entry(host.to_string()).or_default();

        for cookie in new_cookies {
            match existing.iter_mut().find(|c| c.same_key(&cookie)) {
                Some(slot) => {
                    if self.logging {
                        tracing::info!(host, cookie = %cookie, "Replaced cookie");
                    } else {
                        tracing::trace!(host, name = %cookie.name, "Replaced cookie");
                    }
                    *slot = cookie;
                }
                None => {
                    if self.logging {
                        tracing::info!(host, cookie = %cookie, "Added cookie");
                    } else {
                        tracing::trace!(host, name = %cookie.name, "Added cookie");
                    }
                    existing.push(cookie);
                }
            }
        }
    }

    /// Add a single cookie
    pub fn add(&self, host: &str, cookie: Cookie) {
        self.set_cookies(host, std::iter::once(cookie));
    }

    /// Snapshot of every cookie held for a host
    pub fn cookies(&self, host: &str) -> Vec<Cookie> {
        self.cookies
            .get(host)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Cookie header value for a host
    pub fn cookie_header(&self, host: &str) -> Option<String> {
        let list = self.cookies.get(host)?;
        if list.is_empty() {
            return None;
        }
        Some(
            list.iter()
                .map(Cookie::to_header_value)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Hosts that currently hold cookies
    pub fn hosts(&self) -> Vec<String> {
        self.cookies.iter().map(|e| e.key().clone()).collect()
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Clear cookies for a specific host
    pub fn clear_host(&self, host: &str) {
        self.cookies.remove(host);
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl reqwest::cookie::CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let parsed: Vec<Cookie> = cookie_headers
            .filter_map(|h| h.to_str().ok())
            .filter_map(Cookie::parse)
            .collect();
        if parsed.is_empty() {
            return;
        }
        if self.logging {
            tracing::info!(url = %url, "Cookies changed");
        }
        CookieJar::set_cookies(self, &host_key(url), parsed);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.cookie_header(&host_key(url))?;
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    #[test]
    fn test_cookie_parsing() {
        let header = "session=abc123; Domain=.example.com; Path=/; Max-Age=60; Secure; HttpOnly";
        let cookie = Cookie::parse(header).unwrap();

        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/");
        assert_eq!(cookie.max_age, Some(60));
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_cookie_without_path_keeps_empty_path() {
        let cookie = Cookie::parse("a=1").unwrap();
        assert_eq!(cookie.path, "");
        assert!(Cookie::parse("novalue").is_none());
        assert!(Cookie::parse("=1").is_none());
    }

    #[test]
    fn test_replace_not_duplicate() {
        let jar = CookieJar::new();
        jar.add("h", Cookie::new("n", "v1").path("/p"));
        jar.add("h", Cookie::new("n", "v2").path("/p"));

        let list = jar.cookies("h");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value, "v2");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let jar = CookieJar::new();
        let batch = vec![Cookie::new("a", "1").path("/"), Cookie::new("b", "2").path("/")];

        jar.set_cookies("h", batch.clone());
        let first = jar.cookies("h");
        jar.set_cookies("h", batch);

        assert_eq!(jar.cookies("h"), first);
    }

    #[test]
    fn test_replace_keeps_position() {
        let jar = CookieJar::new();
        jar.set_cookies(
            "h",
            vec![Cookie::new("a", "1"), Cookie::new("b", "2"), Cookie::new("c", "3")],
        );
        jar.add("h", Cookie::new("b", "20"));

        assert_eq!(jar.cookie_header("h").as_deref(), Some("a=1; b=20; c=3"));
    }

    #[test]
    fn test_same_name_different_path_coexist() {
        let jar = CookieJar::new();
        jar.add("h", Cookie::new("n", "1").path("/"));
        jar.add("h", Cookie::new("n", "2").path("/admin"));
        jar.add("h", Cookie::new("n", "3"));

        assert_eq!(jar.cookies("h").len(), 3);
    }

    #[test]
    fn test_hosts_never_mix() {
        let jar = CookieJar::new();
        jar.add("a.example.com", Cookie::new("sid", "a"));
        jar.add("b.example.com", Cookie::new("sid", "b"));

        assert_eq!(jar.cookie_header("a.example.com").as_deref(), Some("sid=a"));
        assert_eq!(jar.cookie_header("b.example.com").as_deref(), Some("sid=b"));
        assert!(jar.cookies("example.com").is_empty());
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_host_key_includes_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(host_key(&url), "127.0.0.1:8080");

        let url = Url::parse("https://example.com:443/x").unwrap();
        assert_eq!(host_key(&url), "example.com");
    }

    #[test]
    fn test_cookie_store_round_trip_through_transport_hooks() {
        let jar = CookieJar::with_logging(true);
        let url = Url::parse("https://example.com/login").unwrap();
        let headers = [
            HeaderValue::from_static("sid=1; Path=/"),
            HeaderValue::from_static("theme=dark"),
        ];

        CookieStore::set_cookies(&jar, &mut headers.iter(), &url);

        let other = Url::parse("https://example.com/account").unwrap();
        let value = CookieStore::cookies(&jar, &other).unwrap();
        assert_eq!(value.to_str().unwrap(), "sid=1; theme=dark");

        let foreign = Url::parse("https://other.com/").unwrap();
        assert!(CookieStore::cookies(&jar, &foreign).is_none());
    }

    #[test]
    fn test_concurrent_merges_do_not_duplicate() {
        let jar = CookieJar::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let jar = jar.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        jar.add("h", Cookie::new("shared", i.to_string()).path("/"));
                        jar.add("h", Cookie::new(format!("own{}", i), "x").path("/"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(jar.cookies("h").len(), 9);
    }
}
