//! # Builder Module
//!
//! Provides the `CrawlerBuilder`, a fluent API for constructing and
//! configuring [`Crawler`] instances.
//!
//! ## Overview
//!
//! The builder assembles the frontier queue, result cache, plugins, and
//! worker pool into a configured crawl session. Invalid settings are
//! rejected at `build()` time with a
//! [`ConfigurationError`](crate::LinkcheckError::ConfigurationError),
//! never deferred to the first operation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linkcheck_core::{CrawlerBuilder, SslCertCheck};
//! use url::Url;
//!
//! let crawler = CrawlerBuilder::new(MyChecker)
//!     .workers(8)
//!     .max_urls(10_000)
//!     .add_plugin(SslCertCheck::new())
//!     .seed(Url::parse("https://example.com/")?)
//!     .build()?;
//! crawler.run()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::cache::MemoryResultCache;
use crate::checker::Checker;
use crate::crawler::Crawler;
use crate::error::{LinkcheckError, Result};
use crate::item::UrlTask;
use crate::plugin::{ContentPlugin, PluginManager};
use crate::queue::UrlQueue;

/// Configuration for a crawl session.
pub struct CrawlerConfig {
    /// Number of checker worker threads.
    pub workers: usize,
    /// Cap on the total number of URLs the frontier will ever accept.
    pub max_urls: Option<usize>,
    /// Wall-clock deadline for the drain; `None` waits indefinitely.
    pub join_timeout: Option<Duration>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            workers: num_cpus::get().clamp(2, 16),
            max_urls: None,
            join_timeout: None,
        }
    }
}

pub struct CrawlerBuilder<C: Checker> {
    config: CrawlerConfig,
    checker: C,
    plugins: Vec<Box<dyn ContentPlugin>>,
    seeds: Vec<UrlTask>,
}

impl<C: Checker> CrawlerBuilder<C> {
    /// Creates a builder around the given checker with default settings.
    pub fn new(checker: C) -> Self {
        Self {
            config: CrawlerConfig::default(),
            checker,
            plugins: Vec::new(),
            seeds: Vec::new(),
        }
    }

    /// Sets the number of worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Caps the total number of URLs accepted over the crawl's lifetime.
    pub fn max_urls(mut self, max_urls: usize) -> Self {
        self.config.max_urls = Some(max_urls);
        self
    }

    /// Bounds how long the coordinator waits for the frontier to drain
    /// before shutting down with work remaining.
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = Some(timeout);
        self
    }

    /// Registers a content plugin. Plugins run in registration order.
    pub fn add_plugin<P>(mut self, plugin: P) -> Self
    where
        P: ContentPlugin + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Adds a start URL for the crawl.
    pub fn seed(mut self, url: Url) -> Self {
        self.seeds.push(UrlTask::new(url));
        self
    }

    /// Adds a pre-built start task, e.g. one already carrying a result.
    pub fn seed_task(mut self, task: UrlTask) -> Self {
        self.seeds.push(task);
        self
    }

    /// Builds the `Crawler`, validating the configuration.
    pub fn build(self) -> Result<Crawler<C>> {
        if self.config.workers == 0 {
            return Err(LinkcheckError::ConfigurationError(
                "workers must be greater than 0".to_string(),
            ));
        }
        let cache = MemoryResultCache::new();
        let queue = Arc::new(UrlQueue::new(self.config.max_urls, cache.clone())?);
        Ok(Crawler::new(
            queue,
            cache,
            self.checker,
            PluginManager::new(self.plugins),
            self.seeds,
            self.config.workers,
            self.config.join_timeout,
        ))
    }
}
