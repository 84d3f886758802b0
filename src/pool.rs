// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Bounded pool of fetch clients
//!
//! All clients are built up front. A call takes one free client, runs
//! on it and hands it back, so at most `size` fetches are in flight
//! through the pool at once. Callers beyond that wait on a semaphore
//! for a bounded time and then fail with [`Error::PoolExhausted`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use reqwest::Method;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::http::{FetchClient, MultipartFile, Response};

/// Largest pool that will be built
pub const MAX_POOL_SIZE: usize = 100;

/// How long a call waits for a free client by default
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool of pre-built fetch clients
pub struct ClientPool {
    /// Underlying clients, one per slot
    clients: Vec<FetchClient>,
    /// Indices of free slots
    free: Arc<Mutex<Vec<usize>>>,
    /// One permit per free slot
    semaphore: Arc<Semaphore>,
    /// Wait budget for a free slot
    acquire_timeout: Duration,
    /// Pool statistics
    stats: Arc<RwLock<PoolStats>>,
}

/// Pool statistics
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Slots handed out
    pub acquisitions: u64,
    /// Slots handed back
    pub releases: u64,
    /// Slots currently busy
    pub in_use: u64,
    /// Most slots busy at once
    pub peak_in_use: u64,
    /// Calls that gave up waiting for a slot
    pub exhausted: u64,
    /// Total wait time for acquiring slots (ms)
    pub total_wait_ms: u64,
}

/// A client checked out of the pool.
///
/// The slot is marked free again when this is dropped, whether the
/// fetch succeeded, failed or was cancelled.
pub struct PooledClient {
    client: FetchClient,
    index: usize,
    free: Arc<Mutex<Vec<usize>>>,
    stats: Arc<RwLock<PoolStats>>,
    _permit: OwnedSemaphorePermit,
}

impl PooledClient {
    /// Slot index of this client
    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::ops::Deref for PooledClient {
    type Target = FetchClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl Drop for PooledClient {
    fn drop(&mut self) {
        // Slot goes back before the permit so a woken waiter always finds it.
        self.free.lock().push(self.index);
        let mut stats = self.stats.write();
        stats.releases += 1;
        stats.in_use = stats.in_use.saturating_sub(1);
    }
}

impl ClientPool {
    /// Create a pool of `size` clients, clamped to `1..=100`
    pub fn new(mut config: FetchConfig, size: usize) -> Result<Self> {
        let size = size.clamp(1, MAX_POOL_SIZE);
        if size >= 10 {
            config.max_idle_per_host = size;
        }

        let clients = (0..size)
            .map(|_| FetchClient::new(config.clone()))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(size, "Client pool created");

        Ok(Self {
            clients,
            free: Arc::new(Mutex::new((0..size).rev().collect())),
            semaphore: Arc::new(Semaphore::new(size)),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            stats: Arc::new(RwLock::new(PoolStats::default())),
        })
    }

    /// Pool of clients emulating an agent preset
    pub fn with_agent(agent: &str, size: usize) -> Result<Self> {
        Self::new(FetchConfig::for_agent(agent), size)
    }

    /// Change how long a call waits for a free client
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Check out a free client, waiting up to the acquire timeout
    pub async fn acquire(&self) -> Result<PooledClient> {
        let start = Instant::now();

        let permit = match tokio::time::timeout(
            self.acquire_timeout,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        {
            Ok(permit) => permit.map_err(|_| Error::config("Pool semaphore closed"))?,
            Err(_) => {
                let waited_ms = start.elapsed().as_millis() as u64;
                self.stats.write().exhausted += 1;
                tracing::warn!(waited_ms, size = self.size(), "No free client in pool");
                return Err(Error::PoolExhausted { waited_ms });
            }
        };

        let index = self
            .free
            .lock()
            .pop()
            .ok_or_else(|| Error::config("Pool free list out of sync"))?;

        {
            let mut stats = self.stats.write();
            stats.acquisitions += 1;
            stats.total_wait_ms += start.elapsed().as_millis() as u64;
            stats.in_use += 1;
            if stats.in_use > stats.peak_in_use {
                stats.peak_in_use = stats.in_use;
            }
        }

        Ok(PooledClient {
            client: self.clients[index].clone(),
            index,
            free: Arc::clone(&self.free),
            stats: Arc::clone(&self.stats),
            _permit: permit,
        })
    }

    /// GET through any free client
    pub async fn get(&self, url: &str, referer: &str) -> Result<Response> {
        self.acquire().await?.get(url, referer).await
    }

    /// GET with explicit cookie text through any free client
    pub async fn get_util(&self, url: &str, referer: &str, cookies: &str) -> Result<Response> {
        self.acquire().await?.get_util(url, referer, cookies).await
    }

    /// POST form fields through any free client
    pub async fn post(
        &self,
        url: &str,
        referer: &str,
        fields: &HashMap<String, String>,
    ) -> Result<Response> {
        self.acquire().await?.post(url, referer, fields).await
    }

    /// POST form fields with explicit cookie text through any free client
    pub async fn post_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        fields: &HashMap<String, String>,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_util(url, referer, cookies, fields)
            .await
    }

    /// POST a raw body through any free client
    pub async fn post_bytes(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        body: impl Into<Bytes>,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_bytes(url, referer, cookies, body)
            .await
    }

    /// POST XML through any free client
    pub async fn post_xml(&self, url: &str, referer: &str, xml: &str) -> Result<Response> {
        self.acquire().await?.post_xml(url, referer, xml).await
    }

    /// POST XML with explicit cookie text through any free client
    pub async fn post_xml_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        xml: &str,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_xml_util(url, referer, cookies, xml)
            .await
    }

    /// POST JSON through any free client
    pub async fn post_json(&self, url: &str, referer: &str, json: &str) -> Result<Response> {
        self.acquire().await?.post_json(url, referer, json).await
    }

    /// POST JSON with explicit cookie text through any free client
    pub async fn post_json_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        json: &str,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_json_util(url, referer, cookies, json)
            .await
    }

    /// POST multipart/form-data through any free client
    pub async fn post_multipart(
        &self,
        url: &str,
        referer: &str,
        boundary: &str,
        fields: &HashMap<String, String>,
        files: &HashMap<String, MultipartFile>,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_multipart(url, referer, boundary, fields, files)
            .await
    }

    /// POST multipart/form-data with explicit cookie text through any free client
    pub async fn post_multipart_util(
        &self,
        url: &str,
        referer: &str,
        cookies: &str,
        boundary: &str,
        fields: &HashMap<String, String>,
        files: &HashMap<String, MultipartFile>,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .post_multipart_util(url, referer, cookies, boundary, fields, files)
            .await
    }

    /// Any bodiless method through any free client
    pub async fn method(&self, method: Method, url: &str, referer: &str) -> Result<Response> {
        self.acquire().await?.method(method, url, referer).await
    }

    /// Any bodiless method with explicit cookie text through any free client
    pub async fn method_util(
        &self,
        method: Method,
        url: &str,
        referer: &str,
        cookies: &str,
    ) -> Result<Response> {
        self.acquire()
            .await?
            .method_util(method, url, referer, cookies)
            .await
    }

    /// GET every URL concurrently, results in input order
    pub async fn fetch_all(&self, urls: &[String], referer: &str) -> Vec<Result<Response>> {
        let tasks = urls.iter().map(|url| self.get(url, referer));
        futures::future::join_all(tasks).await
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.read().clone()
    }

    /// Number of clients in the pool
    pub fn size(&self) -> usize {
        self.clients.len()
    }

    /// Number of clients currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait budget for a free client
    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.acquisitions, 0);
        assert_eq!(stats.in_use, 0);
    }

    #[test]
    fn test_size_is_clamped() {
        assert_eq!(ClientPool::new(FetchConfig::default(), 0).unwrap().size(), 1);
        assert_eq!(ClientPool::new(FetchConfig::default(), 250).unwrap().size(), MAX_POOL_SIZE);
        assert_eq!(ClientPool::new(FetchConfig::default(), 3).unwrap().size(), 3);
    }

    #[test]
    fn test_idle_connections_follow_size() {
        let pool = ClientPool::new(FetchConfig::default(), 12).unwrap();
        assert_eq!(pool.clients[0].config().max_idle_per_host, 12);

        let pool = ClientPool::new(FetchConfig::default(), 2).unwrap();
        assert_eq!(
            pool.clients[0].config().max_idle_per_host,
            crate::config::DEFAULT_MAX_IDLE_PER_HOST
        );
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let pool = ClientPool::new(FetchConfig::default(), 2).unwrap();
        assert_eq!(pool.available(), 2);

        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_ne!(a.index(), b.index());
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.stats().in_use, 2);

        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);

        let stats = pool.stats();
        assert_eq!(stats.acquisitions, 2);
        assert_eq!(stats.releases, 2);
        assert_eq!(stats.peak_in_use, 2);
        assert_eq!(stats.in_use, 0);
    }

    #[tokio::test]
    async fn test_saturated_pool_times_out() {
        let pool = ClientPool::new(FetchConfig::default(), 1)
            .unwrap()
            .with_acquire_timeout(Duration::from_millis(50));
        let _held = pool.acquire().await.unwrap();

        let err = pool.get("http://127.0.0.1:9/", "").await.unwrap_err();
        assert!(err.is_pool_exhausted());
        assert_eq!(pool.stats().exhausted, 1);
        assert_eq!(pool.stats().acquisitions, 1);
    }

    #[tokio::test]
    async fn test_waiter_gets_released_slot() {
        let pool = Arc::new(
            ClientPool::new(FetchConfig::default(), 1)
                .unwrap()
                .with_acquire_timeout(Duration::from_secs(5)),
        );
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.map(|c| c.index()) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert_eq!(waiter.await.unwrap().unwrap(), 0);
    }
}
