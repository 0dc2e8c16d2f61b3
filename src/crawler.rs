//! The core Crawler implementation for `linkcheck-core`.
//!
//! This module defines the `Crawler` struct, which acts as the central
//! orchestrator for a link-check session. It ties together the frontier
//! queue, the checker, content plugins, the shared result cache, and the
//! statistics collector to execute a crawl.
//!
//! It uses a thread-per-worker model: each worker loops dequeuing tasks,
//! running the checker, offering discovered links back to the frontier,
//! and reporting completion, while the calling thread coordinates the
//! drain and the final shutdown.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::cache::MemoryResultCache;
use crate::checker::Checker;
use crate::error::{LinkcheckError, Result};
use crate::item::{CheckStatus, QueueItem, UrlTask};
use crate::plugin::PluginManager;
use crate::queue::UrlQueue;
use crate::stats::StatCollector;

/// How long an idle worker waits in `get` before re-checking for shutdown.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// The central orchestrator for a link-check session.
///
/// Built via [`CrawlerBuilder`](crate::builder::CrawlerBuilder).
pub struct Crawler<C: Checker> {
    queue: Arc<UrlQueue<UrlTask>>,
    cache: Arc<MemoryResultCache>,
    checker: Arc<C>,
    plugins: Arc<PluginManager>,
    stats: Arc<StatCollector>,
    seeds: Vec<UrlTask>,
    workers: usize,
    join_timeout: Option<Duration>,
}

impl<C: Checker> Crawler<C> {
    pub(crate) fn new(
        queue: Arc<UrlQueue<UrlTask>>,
        cache: Arc<MemoryResultCache>,
        checker: C,
        plugins: PluginManager,
        seeds: Vec<UrlTask>,
        workers: usize,
        join_timeout: Option<Duration>,
    ) -> Self {
        Crawler {
            queue,
            cache,
            checker: Arc::new(checker),
            plugins: Arc::new(plugins),
            stats: Arc::new(StatCollector::new()),
            seeds,
            workers,
            join_timeout,
        }
    }

    /// Runs the crawl to completion: seeds the frontier, spawns the worker
    /// pool, waits for the frontier to drain (bounded by the configured
    /// deadline, if any), shuts the queue down, and joins the workers.
    ///
    /// A crawl cut short by the configured deadline is not an error; it is
    /// logged and the partial results remain in the cache and stats.
    pub fn run(self) -> Result<()> {
        info!(
            workers = self.workers,
            seeds = self.seeds.len(),
            "crawler starting"
        );

        for seed in self.seeds {
            self.stats.increment_urls_enqueued();
            self.queue.put(seed);
        }

        let mut handles = Vec::with_capacity(self.workers);
        for n in 0..self.workers {
            trace!(worker = n, "spawning checker worker");
            let queue = Arc::clone(&self.queue);
            let cache = Arc::clone(&self.cache);
            let checker = Arc::clone(&self.checker);
            let plugins = Arc::clone(&self.plugins);
            let stats = Arc::clone(&self.stats);
            let handle = thread::Builder::new()
                .name(format!("checker-{n}"))
                .spawn(move || worker_loop(queue, cache, checker, plugins, stats))
                .map_err(|e| {
                    LinkcheckError::InvalidState(format!("failed to spawn worker thread: {e}"))
                })?;
            handles.push(handle);
        }

        match self.queue.join(self.join_timeout) {
            Ok(()) => debug!("frontier drained"),
            Err(LinkcheckError::Timeout) => {
                warn!(
                    timeout = ?self.join_timeout,
                    "crawl deadline reached with work remaining, shutting down early"
                );
            }
            Err(e) => return Err(e),
        }

        self.queue.shutdown()?;

        for handle in handles {
            if handle.join().is_err() {
                error!("worker thread panicked during crawl");
            }
        }

        info!("crawl finished. {}", self.stats);
        Ok(())
    }

    /// Returns a cloned handle to the statistics collector, usable during
    /// or after the crawl.
    pub fn stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }

    /// Returns a cloned handle to the frontier queue, e.g. for an external
    /// monitoring thread reading [`status`](UrlQueue::status).
    pub fn queue(&self) -> Arc<UrlQueue<UrlTask>> {
        Arc::clone(&self.queue)
    }

    /// Returns a cloned handle to the shared result cache.
    pub fn result_cache(&self) -> Arc<MemoryResultCache> {
        Arc::clone(&self.cache)
    }
}

fn worker_loop<C: Checker>(
    queue: Arc<UrlQueue<UrlTask>>,
    cache: Arc<MemoryResultCache>,
    checker: Arc<C>,
    plugins: Arc<PluginManager>,
    stats: Arc<StatCollector>,
) {
    loop {
        let mut task = match queue.get(Some(IDLE_POLL)) {
            Ok(task) => task,
            Err(LinkcheckError::Empty) => {
                if queue.is_shutdown() {
                    break;
                }
                continue;
            }
            Err(e) => {
                error!("worker stopping: {e}");
                break;
            }
        };

        // Pre-resolved items from the fast-drain tier are retired without
        // invoking the checker.
        if let Some(result) = task.take_result() {
            trace!(url = %task.url(), "retiring pre-resolved task");
            stats.increment_drained_from_cache();
            if let Some(key) = task.cache_key() {
                cache.insert(key.result_key(), result);
            }
            if retire(&queue, &task).is_err() {
                break;
            }
            continue;
        }

        // Same target already checked on behalf of another page: reuse the
        // cached result instead of checking again.
        if let Some(key) = task.cache_key() {
            if cache.get(key.result_key()).is_some() {
                trace!(url = %task.url(), "reusing cached result");
                stats.increment_drained_from_cache();
                if retire(&queue, &task).is_err() {
                    break;
                }
                continue;
            }
        }

        trace!(url = %task.url(), depth = task.depth(), "checking");
        let outcome = checker.check(&task);
        let mut result = outcome.result;
        if let Some(page) = &outcome.page {
            plugins.inspect(&task, page, &mut result);
        }

        // The result is final once the plugins have run; publish it before
        // offering discovered links, so a duplicate target admitted from
        // here on finds it in the cache instead of being re-checked.
        if let Some(key) = task.cache_key() {
            cache.insert(key.result_key(), result.clone());
        }

        for discovered in outcome.discovered {
            stats.increment_urls_discovered();
            queue.put(discovered);
        }
        task.add_aliases(outcome.aliases);

        stats.record_check(
            result.status.label(),
            matches!(result.status, CheckStatus::Valid),
            result.warnings.len(),
        );

        if retire(&queue, &task).is_err() {
            break;
        }
    }
}

// task_done failure means the accounting contract was broken somewhere;
// the worker cannot meaningfully continue.
fn retire(queue: &UrlQueue<UrlTask>, task: &UrlTask) -> Result<()> {
    queue.task_done(task).map_err(|e| {
        error!(url = %task.url(), "accounting violation, stopping worker: {e}");
        e
    })
}
