// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request construction and body encoding

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use super::agent::HeaderSet;
use super::headers::{COOKIE, REFERER};
use crate::error::{Error, Result};

/// Boundary used when a multipart caller passes an empty one
pub const DEFAULT_BOUNDARY: &str = "----WebKitFormBoundaryTP3TumA8yjBZCv2R";

/// A fully assembled request, not yet bound to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Request method
    pub method: Method,
    /// Parsed request URL
    pub url: Url,
    /// Headers in the order they are applied
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<Bytes>,
}

impl PreparedRequest {
    /// Get a header value by exact name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Header names in application order
    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Convert into a transport request, validating every header
    pub fn into_reqwest(self) -> Result<reqwest::Request> {
        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_header(name, e))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }

        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = headers;
        if let Some(body) = self.body {
            *request.body_mut() = Some(body.into());
        }
        Ok(request)
    }
}

/// Composes one outgoing request.
///
/// `referer` and `cookies` only take effect when non-empty. An empty
/// cookie string leaves the `Cookie` header to the transport's jar.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    referer: String,
    cookies: String,
    body: Bytes,
}

impl RequestBuilder {
    /// Create a new request builder
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            referer: String::new(),
            cookies: String::new(),
            body: Bytes::new(),
        }
    }

    /// Set the referer
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set explicit cookie text
    pub fn cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = cookies.into();
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the request against a client's header set.
    ///
    /// Headers come out in ascending name order. `Referer` and `Cookie`
    /// overlay the set for this request only.
    pub fn build(self, headers: &HeaderSet) -> Result<PreparedRequest> {
        let url = Url::parse(&self.url)?;

        let mut merged = headers.clone();
        if !self.referer.is_empty() {
            merged.set(REFERER, self.referer);
        }
        if !self.cookies.is_empty() {
            merged.set(COOKIE, self.cookies);
        }

        let body = if self.body.is_empty() {
            None
        } else {
            Some(self.body)
        };

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers: merged
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        })
    }
}

/// A file part of a multipart/form-data body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    /// File name sent in Content-Disposition
    pub file_name: String,
    /// Content type of the part
    pub content_type: String,
    /// Raw file content
    pub content: Bytes,
}

impl MultipartFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Encode form fields as `application/x-www-form-urlencoded`, keys sorted
pub fn encode_form(fields: &HashMap<String, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in sorted(fields) {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

/// Resolve the boundary a multipart body uses
pub fn multipart_boundary(boundary: &str) -> &str {
    if boundary.is_empty() {
        DEFAULT_BOUNDARY
    } else {
        boundary
    }
}

/// Content-Type value for a multipart body
pub fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", multipart_boundary(boundary))
}

/// Encode a multipart/form-data body.
///
/// Text fields come first, then files, each group in ascending name
/// order so the same input always yields the same bytes.
pub fn encode_multipart(
    boundary: &str,
    fields: &HashMap<String, String>,
    files: &HashMap<String, MultipartFile>,
) -> Bytes {
    let boundary = multipart_boundary(boundary);
    let mut body = Vec::new();

    for (name, value) in sorted(fields) {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, file) in sorted(files) {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, file.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(&file.content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    Bytes::from(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_headers() -> HeaderSet {
        HeaderSet::new()
            .with("User-Agent", "test")
            .with("Accept", "*/*")
            .with("X-Trace", "1")
    }

    #[test]
    fn test_malformed_url_aborts() {
        let err = RequestBuilder::new(Method::GET, "not a url")
            .build(&base_headers())
            .unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_headers_in_ascending_order() {
        let req = RequestBuilder::new(Method::GET, "https://example.com/")
            .referer("https://example.com/prev")
            .cookies("a=1")
            .build(&base_headers())
            .unwrap();

        assert_eq!(
            req.header_names(),
            vec!["Accept", "Cookie", "Referer", "User-Agent", "X-Trace"]
        );
    }

    #[test]
    fn test_header_construction_is_deterministic() {
        let build = || {
            RequestBuilder::new(Method::POST, "https://example.com/")
                .referer("https://example.com/")
                .body("x=1")
                .build(&base_headers())
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_empty_referer_and_cookie_are_not_set() {
        let req = RequestBuilder::new(Method::GET, "https://example.com/")
            .build(&base_headers())
            .unwrap();

        assert!(req.header("Referer").is_none());
        assert!(req.header("Cookie").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn test_overlay_does_not_touch_header_set() {
        let headers = base_headers();
        RequestBuilder::new(Method::GET, "https://example.com/")
            .referer("https://example.com/prev")
            .build(&headers)
            .unwrap();
        assert!(headers.get("Referer").is_none());
    }

    #[test]
    fn test_into_reqwest_rejects_bad_header() {
        let headers = HeaderSet::new().with("Bad Header", "x");
        let err = RequestBuilder::new(Method::GET, "https://example.com/")
            .build(&headers)
            .unwrap()
            .into_reqwest()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_into_reqwest_keeps_order_and_body() {
        let req = RequestBuilder::new(Method::POST, "https://example.com/submit")
            .body("payload")
            .build(&base_headers())
            .unwrap()
            .into_reqwest()
            .unwrap();

        let names: Vec<_> = req.headers().keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["accept", "user-agent", "x-trace"]);
        assert_eq!(req.method(), &Method::POST);
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"payload");
    }

    #[test]
    fn test_form_encoding_sorted() {
        let mut fields = HashMap::new();
        fields.insert("user".to_string(), "ydg".to_string());
        fields.insert("a b".to_string(), "c&d".to_string());
        assert_eq!(encode_form(&fields), "a+b=c%26d&user=ydg");
    }

    #[test]
    fn test_multipart_wire_format() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "hello".to_string());
        let mut files = HashMap::new();
        files.insert(
            "upload".to_string(),
            MultipartFile::new("a.txt", "text/plain", "abc"),
        );

        let body = encode_multipart("XyZ", &fields, &files);
        let expected = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            hello\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            abc\r\n\
            --XyZ--\r\n";
        assert_eq!(body, Bytes::from(expected));
    }

    #[test]
    fn test_multipart_default_boundary() {
        let body = encode_multipart("", &HashMap::new(), &HashMap::new());
        assert_eq!(body, Bytes::from(format!("--{}--\r\n", DEFAULT_BOUNDARY)));
        assert_eq!(
            multipart_content_type(""),
            format!("multipart/form-data; boundary={}", DEFAULT_BOUNDARY)
        );
    }

    #[test]
    fn test_multipart_field_order_is_stable() {
        let fields: HashMap<String, String> = (0..20)
            .map(|i| (format!("f{:02}", i), i.to_string()))
            .collect();
        let first = encode_multipart("b", &fields, &HashMap::new());
        let text = String::from_utf8(first.to_vec()).unwrap();

        assert!(text.find("name=\"f00\"").unwrap() < text.find("name=\"f19\"").unwrap());
        assert_eq!(first, encode_multipart("b", &fields.clone(), &HashMap::new()));
    }
}
