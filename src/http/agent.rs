// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Agent presets and the per-client header set

use std::collections::{BTreeMap, HashMap};

use super::headers::{CONTENT_TYPE, USER_AGENT};

/// Baidu spider
pub const BAIDU: &str =
    "Mozilla/5.0 (compatible; Baiduspider/2.0;++http://www.baidu.com/search/spider.html)";
/// Googlebot
pub const GOOGLE: &str = "Mozilla/5.0 (compatible; Googlebot/2.1;+http://www.google.com/bot.html)";
/// Bingbot
pub const BING: &str = "Mozilla/5.0 (compatible; bingbot/2.0;+http://www.bing.com/bingbot.htm)";
/// Desktop Chrome, also the default identity
pub const CHROME: &str = "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36";
/// 360 browser
pub const BROWSER_360: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/45.0.2454.101 Safari/537.36";
/// Internet Explorer 9
pub const IE9: &str = "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.1; Win64; x64; Trident/5.0)";

/// Resolve an agent key to a User-Agent string.
///
/// Keys are matched case-insensitively. An unknown key is returned
/// verbatim, so a full User-Agent string can be passed in directly.
pub fn user_agent_for(agent: &str) -> String {
    match agent.to_lowercase().as_str() {
        "baidu" => BAIDU.to_string(),
        "google" => GOOGLE.to_string(),
        "bing" => BING.to_string(),
        "chrome" | "" => CHROME.to_string(),
        "360" => BROWSER_360.to_string(),
        "ie" | "ie9" => IE9.to_string(),
        _ => agent.to_string(),
    }
}

/// Headers a client sends with every request.
///
/// Names keep the case they were supplied with. Entries are kept sorted,
/// so iteration is always in ascending name order and two sets built
/// from the same entries yield the same header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Browser-like default headers for an agent key
    pub fn preset(agent: &str) -> Self {
        Self::new()
            .with(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .with("Accept-Encoding", "gzip, deflate, sdch")
            .with("Accept-Language", "zh-CN,zh;q=0.8")
            .with("Connection", "keep-alive")
            .with("Upgrade-Insecure-Requests", "1")
            .with(USER_AGENT, user_agent_for(agent))
    }

    /// Build from caller-supplied headers.
    ///
    /// A map holding only `User-Agent` is treated as an agent key and
    /// expanded to [`HeaderSet::preset`]. Anything else is used as given.
    pub fn from_config(headers: &HashMap<String, String>) -> Self {
        if headers.len() == 1 {
            if let Some(agent) = headers.get(USER_AGENT) {
                return Self::preset(agent);
            }
        }
        Self {
            entries: headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Override an entry
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an entry in place
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Set an entry only if it is absent
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| value.into());
    }

    /// Remove an entry
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    /// Get an entry
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Current content type, if any
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// The User-Agent this set sends
    pub fn user_agent(&self) -> Option<&str> {
        self.get(USER_AGENT)
    }

    /// Iterate in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
