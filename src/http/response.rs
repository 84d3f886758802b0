// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types and body decoding

use std::io::Read;

use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Result;

/// Decompress a gzip body, reading every member of a multi-member stream
pub fn ungzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    MultiGzDecoder::new(data).read_to_end(&mut decoded)?;
    Ok(decoded)
}

/// Decode a response body, falling back to the raw bytes when it is not
/// gzip. Never fails.
pub fn decode_body(raw: Bytes) -> Bytes {
    match ungzip(&raw) {
        Ok(decoded) => Bytes::from(decoded),
        Err(e) => {
            tracing::trace!(error = %e, "Body is not gzip, using raw bytes");
            raw
        }
    }
}

/// A successful, fully read response
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code, 200 or 202
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded response body
    pub body: Bytes,
    /// Final URL (after redirects)
    pub url: Url,
    /// Whether this was a redirect
    pub redirected: bool,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

impl Response {
    /// Create a new response
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        url: Url,
        redirected: bool,
        response_time_ms: u64,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            redirected,
            response_time_ms,
        }
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get body as text, lossy conversion
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get all values for a header
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get Set-Cookie headers
    pub fn set_cookies(&self) -> Vec<&str> {
        self.header_all("set-cookie")
    }

    /// Get the final URL as string
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gzip_body_is_decoded() {
        let compressed = gzip(b"<html>hello</html>");
        assert_eq!(decode_body(Bytes::from(compressed)), Bytes::from("<html>hello</html>"));
    }

    #[test]
    fn test_concatenated_gzip_members_are_all_decoded() {
        let mut body = gzip(b"first-half ");
        body.extend_from_slice(&gzip(b"second-half"));

        assert_eq!(
            decode_body(Bytes::from(body)),
            Bytes::from("first-half second-half")
        );
    }

    #[test]
    fn test_plain_body_passes_through_unchanged() {
        let raw = Bytes::from("plain text, not gzip");
        assert_eq!(decode_body(raw.clone()), raw);
        assert!(ungzip(&raw).is_err());
    }

    #[test]
    fn test_empty_body_passes_through() {
        assert_eq!(decode_body(Bytes::new()), Bytes::new());
    }

    #[test]
    fn test_response_text_and_json() {
        let resp = Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from(r#"{"ok":true}"#),
            Url::parse("https://example.com").unwrap(),
            false,
            100,
        );
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.text(), r#"{"ok":true}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["ok"], true);
    }
}
