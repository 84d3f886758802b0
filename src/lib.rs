// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Gather - Browser-Emulating Fetch Client
//!
//! An HTTP client for collecting web content that behaves like one
//! browser session: it keeps the cookies servers set, sends a fixed
//! browser identity and decodes gzip bodies on its own.
//!
//! ## Features
//!
//! - Agent presets: chrome, baidu, google, bing, 360, ie, or any literal UA
//! - Session cookies: per-host jar, merged on every response hop
//! - Deterministic headers: always applied in ascending name order
//! - Form, raw, XML, JSON and multipart POST bodies
//! - Client pool: bounded parallel fetching with a timed wait for a slot
//!
//! ## Example
//!
//! ```rust,no_run
//! use gather::{ClientPool, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = ClientPool::new(FetchConfig::for_agent("chrome").timeout_secs(60), 3)?;
//!
//!     let page = pool.get("https://example.com/", "").await?;
//!     println!("{} -> {} bytes", page.url, page.body.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod pool;

// Configuration
pub use config::FetchConfig;

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{
    Cookie, CookieJar, FetchClient, HeaderSet, MultipartFile, PreparedRequest, RequestBuilder,
    Response,
};

// Pool
pub use pool::{ClientPool, PoolStats, PooledClient};

/// Gather version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
