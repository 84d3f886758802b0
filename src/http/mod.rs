// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for gather
//!
//! Agent presets, the session cookie jar, deterministic request
//! construction and the fetch client built on top of them.

pub mod agent;
mod client;
mod cookie;
mod request;
mod response;

pub use agent::{user_agent_for, HeaderSet};
pub use client::FetchClient;
pub use cookie::{host_key, Cookie, CookieJar, SameSite};
pub use request::{
    encode_form, encode_multipart, MultipartFile, PreparedRequest, RequestBuilder,
    DEFAULT_BOUNDARY,
};
pub use response::{decode_body, ungzip, Response};

/// Header names as a client stores them. Header sets are case-sensitive,
/// so these are the spellings browsers send.
pub mod headers {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const COOKIE: &str = "Cookie";
    pub const REFERER: &str = "Referer";
    pub const USER_AGENT: &str = "User-Agent";
}
