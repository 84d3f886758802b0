// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fetch client implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{self, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode};
use url::Url;
use serde::Serialize;
use tokio::sync::Mutex;

use super::agent::HeaderSet;
use super::cookie::CookieJar;
use super::headers::CONTENT_TYPE;
use super::request::{
    encode_form, encode_multipart, multipart_content_type, MultipartFile, RequestBuilder,
};
use super::response::{decode_body, Response};
use crate::config::FetchConfig;
use crate::error::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const XML_CONTENT_TYPE: &str = "application/xml";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Setup failures are configuration errors, not transport errors
fn config_error(context: &str, e: reqwest::Error) -> Error {
    Error::config(format!("{}: {}", context, e))
}

/// How a call treats the client's stored `Content-Type`
enum ContentType {
    /// Leave whatever is stored
    Keep,
    /// Store this one unless a content type is already set
    IfAbsent(&'static str),
    /// Always store this one
    Force(String),
}

/// HTTP client with a session cookie jar and a fixed browser identity.
///
/// Every fetch holds the client's lock from request construction until
/// the body has been read, so fetches through one client (and its
/// clones) run strictly one after another. Use [`crate::ClientPool`] for
/// parallelism.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    config: Arc<FetchConfig>,
    cookie_jar: CookieJar,
    headers: Arc<Mutex<HeaderSet>>,
}

impl FetchClient {
    /// Create a new client from a configuration
    pub fn new(config: FetchConfig) -> Result<Self> {
        let cookie_jar = CookieJar::with_logging(config.cookie_logging);

        let mut builder = Client::builder()
            .cookie_provider(Arc::new(cookie_jar.clone()))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .http1_title_case_headers();

        builder = match config.proxy {
            Some(ref proxy_url) => builder.proxy(
                reqwest::Proxy::all(proxy_url).map_err(|e| config_error("Invalid proxy URL", e))?,
            ),
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| config_error("Failed to build HTTP client", e))?;
        let headers = HeaderSet::from_config(&config.headers);

        Ok(Self {
            client,
            config: Arc::new(config),
            cookie_jar,
            headers: Arc::new(Mutex::new(headers)),
        })
    }

    /// Client emulating an agent preset, with a 300 second timeout
    pub fn with_agent(agent: &str, cookie_logging: bool) -> Result<Self> {
        Self::new(FetchConfig::for_agent(agent).cookie_logging(cookie_logging))
    }

    /// Client emulating an agent preset through a proxy
    pub fn with_proxy(agent: &str, proxy_url: &str, cookie_logging: bool) -> Result<Self> {
        Self::new(
            FetchConfig::for_agent(agent)
                .proxy(proxy_url)
                .cookie_logging(cookie_logging),
        )
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get client configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Snapshot of the headers sent with every request
    pub async fn headers(&self) -> HeaderSet {
        self.headers.lock().await.clone()
    }

    /// Set a header for all following requests
    pub async fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.lock().await.set(name, value);
    }

    /// Remove a header for all following requests
    pub async fn remove_header(&self, name: &str) -> Option<String> {
        self.headers.lock().await.remove(name)
    }

    /// GET, cookies supplied by the jar
    pub async fn get(&self, url: &str, referer: &str) -> Result<Response> {
        self.get_util(url, referer, "").await
    }

    /// GET with explicit cookie text; empty text defers to the jar
    pub async fn get_util(&self, url: &str, referer: &str, cookies: &str) -> Result<Response> {
        let request = RequestBuilder::new(Method::GET, url)
            .referer(referer)
            .cookies(cookies);
        self.fetch(request, ContentType::Keep).await
    }

    /// POST form fields, cookies supplied by the jar
    pub async fn post(
        &self,
        url: &str,
        referer: &str,
        fields: &HashMap<String, String>,
    ) -> Result<Response> {
        self.post_util(url, referer, "", fields).await
    }

    /// POST form fields with explicit cookie text.
    ///
    /// Sets a urlencoded `Content-Type` only when the client has none, so
    /// a content type chosen earlier on this client is kept.
    pub async fn post_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        fields: &HashMap<String, String>,
    ) -> Result<Response> {
        let request = RequestBuilder::new(Method::POST, url)
            .referer(referer)
            .cookies(cookies)
            .body(encode_form(fields));
        self.fetch(request, ContentType::IfAbsent(FORM_CONTENT_TYPE))
            .await
    }

    /// POST a raw body without touching `Content-Type`
    pub async fn post_bytes(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        body: impl Into<Bytes>,
    ) -> Result<Response> {
        let request = RequestBuilder::new(Method::POST, url)
            .referer(referer)
            .cookies(cookies)
            .body(body);
        self.fetch(request, ContentType::Keep).await
    }

    /// POST an XML document, cookies supplied by the jar
    pub async fn post_xml(&self, url: &str, referer: &str, xml: &str) -> Result<Response> {
        self.post_xml_util(url, referer, "", xml).await
    }

    /// POST an XML document with explicit cookie text
    pub async fn post_xml_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        xml: &str,
    ) -> Result<Response> {
        let request = RequestBuilder::new(Method::POST, url)
            .referer(referer)
            .cookies(cookies)
            .body(xml.to_string());
        self.fetch(request, ContentType::Force(XML_CONTENT_TYPE.to_string()))
            .await
    }

    /// POST a JSON document, cookies supplied by the jar
    pub async fn post_json(&self, url: &str, referer: &str, json: &str) -> Result<Response> {
        self.post_json_util(url, referer, "", json).await
    }

    /// POST a JSON document with explicit cookie text
    pub async fn post_json_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        json: &str,
    ) -> Result<Response> {
        let request = RequestBuilder::new(Method::POST, url)
            .referer(referer)
            .cookies(cookies)
            .body(json.to_string());
        self.fetch(request, ContentType::Force(JSON_CONTENT_TYPE.to_string()))
            .await
    }

    /// Serialize a value and POST it as JSON
    pub async fn post_json_value<T: Serialize + ?Sized>(
        &self,
        url: &str,
        referer: &str,
        value: &T,
    ) -> Result<Response> {
        let json = serde_json::to_string(value)?;
        self.post_json(url, referer, &json).await
    }

    /// POST multipart/form-data, cookies supplied by the jar
    pub async fn post_multipart(
        &self,
        url: &str,
        referer: &str,
        boundary: &str,
        fields: &HashMap<String, String>,
        files: &HashMap<String, MultipartFile>,
    ) -> Result<Response> {
        self.post_multipart_util(url, referer, "", boundary, fields, files)
            .await
    }

    /// POST multipart/form-data with explicit cookie text.
    ///
    /// An empty boundary selects [`super::DEFAULT_BOUNDARY`].
    pub async fn post_multipart_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        boundary: &str,
        fields: &HashMap<String, String>,
        files: &HashMap<String, MultipartFile>,
    ) -> Result<Response> {
        let request = RequestBuilder::new(Method::POST, url)
            .referer(referer)
            .cookies(cookies)
            .body(encode_multipart(boundary, fields, files));
        self.fetch(request, ContentType::Force(multipart_content_type(boundary)))
            .await
    }

    /// Any method without a body, e.g. OPTIONS or HEAD probing
    pub async fn method(&self, method: Method, url: &str, referer: &str) -> Result<Response> {
        self.method_util(method, url, referer, "").await
    }

    /// Any method without a body, with explicit cookie text
    pub async fn method_util(
        &self,
        method: Method,
        url: &str,
        referer: &str,
        cookies: &str,
    ) -> Result<Response> {
        let request = RequestBuilder::new(method, url)
            .referer(referer)
            .cookies(cookies);
        self.fetch(request, ContentType::Keep).await
    }

    async fn fetch(&self, request: RequestBuilder, content_type: ContentType) -> Result<Response> {
        let mut header_set = self.headers.lock().await;

        match content_type {
            ContentType::Keep => {}
            ContentType::IfAbsent(value) => header_set.set_if_absent(CONTENT_TYPE, value),
            ContentType::Force(value) => header_set.set(CONTENT_TYPE, value),
        }

        let request = request.build(&header_set)?.into_reqwest()?;
        let start = Instant::now();
        let requested_url = request.url().clone();
        tracing::debug!(method = %request.method(), url = %requested_url, "Issuing request");

        let response = self.execute_following(request).await?;
        let status = response.status();
        let final_url = response.url().clone();

        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            tracing::debug!(status = status.as_u16(), url = %final_url, "Rejected response");
            return Err(Error::status(status.as_u16(), final_url.as_str()));
        }

        let headers = response.headers().clone();
        let raw = response.bytes().await?;
        let response_time = start.elapsed().as_millis() as u64;
        tracing::debug!(
            status = status.as_u16(),
            url = %final_url,
            bytes = raw.len(),
            elapsed_ms = response_time,
            "Response received"
        );

        Ok(Response::new(
            status,
            headers,
            decode_body(raw),
            final_url.clone(),
            final_url != requested_url,
            response_time,
        ))
    }

    /// Executes a request and follows its redirects. An explicit `Cookie`
    /// header is carried to every hop on the same site; otherwise the jar
    /// supplies cookies for each hop's URL.
    async fn execute_following(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        let origin = request.url().clone();
        let explicit_cookie = request.headers().contains_key(header::COOKIE);
        let mut hops = 0;

        loop {
            let retry = request.try_clone();
            let response = self.client.execute(request).await?;
            let target = match redirect_target(&response)? {
                Some(target) => target,
                None => return Ok(response),
            };
            let previous = match retry {
                Some(previous) => previous,
                None => return Ok(response),
            };

            if hops == self.config.max_redirects {
                return Err(Error::TooManyRedirects {
                    limit: self.config.max_redirects,
                    url: target.to_string(),
                });
            }
            hops += 1;

            tracing::debug!(status = response.status().as_u16(), to = %target, "Following redirect");
            let keep_cookie = explicit_cookie && same_site(&origin, &target);
            request = redirect_request(previous, response.status(), target, keep_cookie);
        }
    }
}

/// Resolved `Location` of a redirect response
fn redirect_target(response: &reqwest::Response) -> Result<Option<Url>> {
    let status = response.status();
    if !matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return Ok(None);
    }

    match response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(location) => Ok(Some(response.url().join(location)?)),
        None => Ok(None),
    }
}

/// Target host is the origin host or one of its subdomains
fn same_site(origin: &Url, target: &Url) -> bool {
    match (origin.host_str(), target.host_str()) {
        (Some(origin), Some(target)) => {
            origin == target || target.ends_with(&format!(".{}", origin))
        }
        _ => false,
    }
}

/// Next hop of a redirect chain.
///
/// 307 and 308 repeat the method and body. 301, 302 and 303 switch to
/// GET (HEAD stays HEAD) and drop the body and its headers. A Referer
/// pointing at the previous URL is added unless one was set or the hop
/// goes from https to http.
fn redirect_request(
    mut previous: reqwest::Request,
    status: StatusCode,
    target: Url,
    keep_cookie: bool,
) -> reqwest::Request {
    let mut from = previous.url().clone();
    let downgrade = from.scheme() == "https" && target.scheme() == "http";
    *previous.url_mut() = target;

    if !matches!(
        status,
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
    ) {
        if *previous.method() != Method::HEAD {
            *previous.method_mut() = Method::GET;
        }
        *previous.body_mut() = None;
        previous.headers_mut().remove(header::CONTENT_TYPE);
        previous.headers_mut().remove(header::CONTENT_LENGTH);
    }

    let headers = previous.headers_mut();
    if !keep_cookie {
        headers.remove(header::COOKIE);
    }
    if !downgrade && !headers.contains_key(header::REFERER) {
        from.set_fragment(None);
        let _ = from.set_username("");
        let _ = from.set_password(None);
        if let Ok(value) = HeaderValue::from_str(from.as_str()) {
            headers.insert(header::REFERER, value);
        }
    }

    previous
}
