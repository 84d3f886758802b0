// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fetch client configuration

use std::collections::HashMap;
use std::time::Duration;

use crate::http::headers::USER_AGENT;

/// Idle connections kept per host when nothing else is requested
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 100;

/// Client configuration, copied into every client built from it
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request headers, or a lone `User-Agent` agent key
    pub headers: HashMap<String, String>,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Log every cookie change
    pub cookie_logging: bool,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Idle connections kept per host
    pub max_idle_per_host: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let mut headers = HashMap::new();
        headers.insert(USER_AGENT.to_string(), String::new());

        Self {
            headers,
            proxy: None,
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            cookie_logging: false,
            accept_invalid_certs: true,
            max_redirects: 10,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
        }
    }
}

impl FetchConfig {
    /// Create a new config with the default agent
    pub fn new() -> Self {
        Self::default()
    }

    /// Config emulating an agent preset (`chrome`, `baidu`, ...)
    pub fn for_agent(agent: impl Into<String>) -> Self {
        Self::default().agent(agent)
    }

    /// Replace all headers with a single agent key
    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.headers.clear();
        self.headers.insert(USER_AGENT.to_string(), agent.into());
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set proxy; an empty string means no proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        let proxy = proxy.into();
        self.proxy = if proxy.is_empty() { None } else { Some(proxy) };
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set timeout in whole seconds
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Log cookie changes
    pub fn cookie_logging(mut self, enabled: bool) -> Self {
        self.cookie_logging = enabled;
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set max redirects
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set idle connections kept per host
    pub fn max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(config.accept_invalid_certs);
        assert!(config.proxy.is_none());
        assert_eq!(config.headers.get(USER_AGENT).map(String::as_str), Some(""));
    }

    #[test]
    fn test_agent_replaces_headers() {
        let config = FetchConfig::new().header("Accept", "*/*").agent("baidu");
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers.get(USER_AGENT).map(String::as_str), Some("baidu"));
    }

    #[test]
    fn test_empty_proxy_is_none() {
        assert!(FetchConfig::new().proxy("").proxy.is_none());
        assert_eq!(
            FetchConfig::new().proxy("http://127.0.0.1:8080").proxy.as_deref(),
            Some("http://127.0.0.1:8080")
        );
    }
}
