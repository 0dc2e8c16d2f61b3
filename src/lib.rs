//! # linkcheck-core
//!
//! Core engine of a concurrent link checker.
//!
//! The heart of the crate is [`UrlQueue`], the crawl frontier: a
//! thread-safe, deduplicating, unbounded work queue with task accounting,
//! two-tier priority ordering, timeout-bounded waits, and cooperative
//! shutdown. Around it sit the worker-pool [`Crawler`], the [`Checker`]
//! trait where fetch logic plugs in, content plugins, a shared result
//! cache, and crawl statistics.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linkcheck_core::prelude::*;
//! use url::Url;
//!
//! struct MyChecker;
//!
//! impl Checker for MyChecker {
//!     fn check(&self, task: &UrlTask) -> CheckOutcome {
//!         // fetch task.url(), classify it, report discovered links
//!         CheckOutcome::of(CheckResult::valid())
//!     }
//! }
//!
//! fn run() -> linkcheck_core::Result<()> {
//!     let crawler = CrawlerBuilder::new(MyChecker)
//!         .workers(8)
//!         .seed(Url::parse("https://example.com/").unwrap())
//!         .build()?;
//!     crawler.run()
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod checker;
pub mod crawler;
pub mod error;
pub mod item;
pub mod plugin;
pub mod prelude;
pub mod queue;
pub mod stats;

pub use builder::{CrawlerBuilder, CrawlerConfig};
pub use cache::{MemoryResultCache, ResultCache};
pub use checker::{CheckOutcome, Checker, PageInfo};
pub use crawler::Crawler;
pub use error::{LinkcheckError, Result};
pub use item::{CacheKey, CheckResult, CheckStatus, QueueItem, UrlTask};
pub use plugin::{ContentPlugin, PluginManager, SslCertCheck};
pub use queue::{QueueStatus, UrlQueue};
pub use stats::StatCollector;

pub use dashmap::DashMap;
pub use url::Url;
