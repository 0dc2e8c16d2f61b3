//! # Frontier Queue Module
//!
//! Implements the crawl frontier: a thread-safe work queue coordinating
//! producers discovering URLs, workers checking them, and a coordinator
//! waiting for the frontier to drain.
//!
//! ## Overview
//!
//! [`UrlQueue`] is the synchronization core of the crawler. Many worker
//! threads concurrently `put` newly discovered items, `get` pending ones,
//! and report completion with `task_done`, while a coordinator blocks in
//! `join` until no work remains or forces early termination with
//! `shutdown`.
//!
//! ## Key Responsibilities
//!
//! - **Admission**: exactly-once dedup by cache key, an optional lifetime
//!   budget on accepted puts, and silent rejection after shutdown
//! - **Ordering**: FIFO within a tier, with a fast-drain front tier for
//!   items that already carry (or can reuse) a computed result
//! - **Accounting**: unfinished/finished/in-progress counters that make
//!   `join` and `shutdown` reconciliation possible
//! - **Waiting**: deadline-bounded blocking in `get` and `join`
//!
//! ## Design
//!
//! All mutable state lives behind one `parking_lot::Mutex`; the two wait
//! conditions (`not_empty`, `all_done`) are condvars scoped to that mutex,
//! so signaling one can never race the other's lock acquisition. The queue
//! is deliberately unbounded: workers are also producers, and a bounded
//! frontier could deadlock with every worker blocked on a full `put`.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::cache::ResultCache;
use crate::error::{LinkcheckError, Result};
use crate::item::{CacheKey, QueueItem};

/// Approximate queue counters for monitoring and progress display.
///
/// The values are a consistent snapshot at the moment they were read, but
/// another thread may mutate the queue immediately after; never base
/// correctness decisions on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Tasks retired via `task_done`.
    pub finished: usize,
    /// Tasks dequeued but not yet marked done.
    pub in_progress: usize,
    /// Items still waiting in the store.
    pub queued: usize,
}

struct QueueState<T> {
    store: VecDeque<T>,
    /// Keys ever accepted, plus aliases of completed items. Grows for the
    /// lifetime of the queue and is never compacted.
    seen: HashSet<CacheKey>,
    /// Items accepted but not yet retired: store contents plus in-flight.
    unfinished: usize,
    finished: usize,
    in_progress: usize,
    /// Remaining admission budget; `None` means unbounded.
    allowed_puts: Option<usize>,
    shutdown: bool,
}

/// A deduplicating, priority-tiered, unbounded work queue for crawl tasks.
///
/// Supports several producer and consumer threads. The `task_done`
/// accounting follows the classic work-queue contract: every successful
/// `get` must be matched by exactly one `task_done` call.
pub struct UrlQueue<T> {
    state: Mutex<QueueState<T>>,
    /// Signaled once after every successful admission.
    not_empty: Condvar,
    /// Signaled when a completion or shutdown reconciliation drives the
    /// unfinished count to zero.
    all_done: Condvar,
    result_cache: Arc<dyn ResultCache>,
    /// Mirror of the locked shutdown flag, written only under the lock.
    shutting_down: AtomicBool,
}

impl<T: QueueItem> UrlQueue<T> {
    /// Creates a queue with an optional cap on the total number of puts it
    /// will ever accept, and the shared result cache consulted for
    /// insertion-tier decisions.
    ///
    /// A budget of `Some(0)` is rejected here rather than surfacing as a
    /// queue that silently drops everything.
    pub fn new(
        max_allowed_puts: Option<usize>,
        result_cache: Arc<dyn ResultCache>,
    ) -> Result<Self> {
        if max_allowed_puts == Some(0) {
            return Err(LinkcheckError::ConfigurationError(
                "max_allowed_puts must be greater than 0".to_string(),
            ));
        }
        Ok(UrlQueue {
            state: Mutex::new(QueueState {
                store: VecDeque::new(),
                seen: HashSet::new(),
                unfinished: 0,
                finished: 0,
                in_progress: 0,
                allowed_puts: max_allowed_puts,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            all_done: Condvar::new(),
            result_cache,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Advisory pre-check for whether a `put` of this item would currently
    /// be accepted.
    ///
    /// The answer may go stale the moment it is returned; producers may use
    /// it to skip building expensive items, never to conclude that a later
    /// `put` will succeed or fail.
    pub fn would_admit(&self, item: &T) -> bool {
        let state = self.state.lock();
        if state.shutdown || state.allowed_puts == Some(0) {
            return false;
        }
        match item.cache_key() {
            Some(key) => !state.seen.contains(key),
            None => true,
        }
    }

    /// Puts an item into the queue.
    ///
    /// Fire-and-forget: a put denied by shutdown, an exhausted budget, or a
    /// duplicate key is dropped silently. That is normal steady-state
    /// behavior during a crawl, not an error.
    pub fn put(&self, item: T) {
        let mut state = self.state.lock();
        if state.shutdown {
            trace!("dropping put: queue is shut down");
            return;
        }
        if let Some(remaining) = state.allowed_puts {
            if remaining == 0 {
                debug!("dropping put: admission budget exhausted");
                return;
            }
            state.allowed_puts = Some(remaining - 1);
        }
        let mut cached_elsewhere = false;
        if let Some(key) = item.cache_key() {
            if state.seen.contains(key) {
                trace!(key = ?key, "dropping duplicate put");
                return;
            }
            state.seen.insert(key.clone());
            cached_elsewhere = self.result_cache.contains(key.result_key());
        }
        state.unfinished += 1;
        // Two-tier priority: items needing no real work drain first.
        if item.has_result() || cached_elsewhere {
            state.store.push_front(item);
        } else {
            state.store.push_back(item);
        }
        self.not_empty.notify_one();
    }

    /// Removes and returns the item at the front of the queue, blocking
    /// while the queue is empty.
    ///
    /// With a timeout, waits at most that long past call entry and fails
    /// with [`LinkcheckError::Empty`] if no item became available; without
    /// one, blocks indefinitely. Wakeups are re-checked against the store,
    /// so spurious or raced notifications never hand out a phantom item.
    pub fn get(&self, timeout: Option<Duration>) -> Result<T> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.store.pop_front() {
                state.in_progress += 1;
                return Ok(item);
            }
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut state, deadline).timed_out()
                        && state.store.is_empty()
                    {
                        return Err(LinkcheckError::Empty);
                    }
                }
                None => self.not_empty.wait(&mut state),
            }
        }
    }

    /// Indicates that a formerly dequeued item is complete.
    ///
    /// Merges the item's alias keys into the seen set, so future puts for
    /// any of them are deduplicated even though the aliases were never
    /// individually queued. Unblocks `join` once no unfinished work
    /// remains.
    ///
    /// Fails with [`LinkcheckError::InvalidState`] when called more times
    /// than items were accepted; callers must treat that as fatal.
    pub fn task_done(&self, item: &T) -> Result<()> {
        let mut state = self.state.lock();
        for alias in item.aliases() {
            state.seen.insert(alias.clone());
        }
        state.finished += 1;
        state.in_progress = state.in_progress.saturating_sub(1);
        if state.unfinished == 0 {
            return Err(LinkcheckError::InvalidState(
                "task_done() called more times than items were queued".to_string(),
            ));
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            trace!("all tasks finished, waking joiners");
            self.all_done.notify_all();
        }
        Ok(())
    }

    /// Blocks until every accepted item has been dequeued and marked done.
    ///
    /// With a timeout, fails with [`LinkcheckError::Timeout`] if unfinished
    /// work remains when the deadline passes.
    pub fn join(&self, timeout: Option<Duration>) -> Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();
        while state.unfinished > 0 {
            match deadline {
                Some(deadline) => {
                    if self.all_done.wait_until(&mut state, deadline).timed_out()
                        && state.unfinished > 0
                    {
                        return Err(LinkcheckError::Timeout);
                    }
                }
                None => self.all_done.wait(&mut state),
            }
        }
        Ok(())
    }

    /// Shuts the queue down: discards everything still waiting in the
    /// store and refuses all future puts.
    ///
    /// Items already dequeued are not cancelled; their owners must still
    /// call `task_done`, and `join` keeps blocking until they do. When no
    /// such in-flight work remains, joiners are woken immediately.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock();
        let queued = state.store.len();
        if state.unfinished < queued {
            return Err(LinkcheckError::InvalidState(
                "shutdown found more queued items than unfinished tasks".to_string(),
            ));
        }
        let outstanding = state.unfinished - queued;
        debug!(
            discarded = queued,
            outstanding, "shutting down frontier queue"
        );
        state.store.clear();
        if outstanding == 0 {
            self.all_done.notify_all();
        }
        state.unfinished = outstanding;
        state.shutdown = true;
        self.shutting_down.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Whether `shutdown` has been called. Lock-free.
    pub fn is_shutdown(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Approximate number of items waiting in the store.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Approximate emptiness check. Unreliable for correctness decisions:
    /// the queue may change before the result is even returned.
    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    /// Approximate counter snapshot for monitoring.
    pub fn status(&self) -> QueueStatus {
        let state = self.state.lock();
        QueueStatus {
            finished: state.finished,
            in_progress: state.in_progress,
            queued: state.store.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryResultCache;
    use crate::item::{CacheKey, CheckResult};
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    struct TestItem {
        key: Option<CacheKey>,
        has_result: bool,
        aliases: Vec<CacheKey>,
    }

    impl TestItem {
        fn keyed(n: usize) -> Self {
            TestItem {
                key: Some(CacheKey::new(None, format!("https://t.example/{n}"))),
                has_result: false,
                aliases: Vec::new(),
            }
        }

        fn resolved(n: usize) -> Self {
            TestItem {
                has_result: true,
                ..Self::keyed(n)
            }
        }
    }

    impl QueueItem for TestItem {
        fn cache_key(&self) -> Option<&CacheKey> {
            self.key.as_ref()
        }
        fn has_result(&self) -> bool {
            self.has_result
        }
        fn aliases(&self) -> &[CacheKey] {
            &self.aliases
        }
    }

    fn queue(budget: Option<usize>) -> UrlQueue<TestItem> {
        UrlQueue::new(budget, MemoryResultCache::new()).unwrap()
    }

    #[test]
    fn zero_budget_is_a_configuration_error() {
        let cache = MemoryResultCache::new();
        let err = UrlQueue::<TestItem>::new(Some(0), cache).err().unwrap();
        assert!(matches!(err, LinkcheckError::ConfigurationError(_)));
    }

    #[test]
    fn join_returns_immediately_after_matching_task_dones() {
        let q = queue(None);
        for n in 0..5 {
            q.put(TestItem::keyed(n));
        }
        for _ in 0..5 {
            let item = q.get(None).unwrap();
            q.task_done(&item).unwrap();
        }
        // Must not block: everything accepted has been retired.
        q.join(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(q.status().finished, 5);
    }

    #[test]
    fn duplicate_key_is_dropped() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(1));
        assert_eq!(q.status().queued, 1);
    }

    #[test]
    fn unkeyed_items_are_never_deduplicated() {
        let q = queue(None);
        q.put(TestItem {
            key: None,
            has_result: false,
            aliases: Vec::new(),
        });
        q.put(TestItem {
            key: None,
            has_result: false,
            aliases: Vec::new(),
        });
        assert_eq!(q.status().queued, 2);
    }

    #[test]
    fn get_times_out_on_empty_queue() {
        let q = queue(None);
        let start = Instant::now();
        let result = q.get(Some(Duration::from_millis(100)));
        assert_eq!(result.err(), Some(LinkcheckError::Empty));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn get_without_timeout_blocks_until_put() {
        let q = Arc::new(queue(None));
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.get(None))
        };
        thread::sleep(Duration::from_millis(20));
        q.put(TestItem::keyed(7));
        assert!(consumer.join().unwrap().is_ok());
    }

    #[test]
    fn extra_task_done_is_an_invalid_state() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        let item = q.get(None).unwrap();
        q.task_done(&item).unwrap();
        let err = q.task_done(&item).err().unwrap();
        assert!(matches!(err, LinkcheckError::InvalidState(_)));
    }

    #[test]
    fn admission_budget_caps_accepted_puts() {
        let q = queue(Some(3));
        for n in 0..4 {
            q.put(TestItem::keyed(n));
        }
        // The fourth put is silently dropped, not an error.
        assert_eq!(q.status().queued, 3);
    }

    #[test]
    fn duplicate_puts_consume_budget() {
        // Admission order is budget first, dedup second: a duplicate put
        // still spends one unit of budget.
        let q = queue(Some(3));
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(2));
        q.put(TestItem::keyed(3));
        assert_eq!(q.status().queued, 2);
    }

    #[test]
    fn resolved_items_jump_the_queue() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(2));
        q.put(TestItem::resolved(3));
        let first = q.get(None).unwrap();
        assert_eq!(
            first.key.as_ref().unwrap().result_key(),
            "https://t.example/3"
        );
    }

    #[test]
    fn cached_results_promote_items_to_the_front() {
        let cache = MemoryResultCache::new();
        cache.insert("https://t.example/9", CheckResult::valid());
        let q: UrlQueue<TestItem> = UrlQueue::new(None, cache).unwrap();

        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(9));
        let first = q.get(None).unwrap();
        assert_eq!(
            first.key.as_ref().unwrap().result_key(),
            "https://t.example/9"
        );
    }

    #[test]
    fn priority_tier_preserves_arrival_order() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        q.put(TestItem::resolved(2));
        q.put(TestItem::resolved(3));
        // Front insertion reverses within the tier relative to arrival,
        // which still drains both resolved items before the ordinary one.
        let a = q.get(None).unwrap();
        let b = q.get(None).unwrap();
        let c = q.get(None).unwrap();
        assert!(a.has_result && b.has_result);
        assert_eq!(c.key.as_ref().unwrap().result_key(), "https://t.example/1");
    }

    #[test]
    fn aliases_are_seen_after_task_done() {
        let q = queue(None);
        let alias = CacheKey::new(None, "https://t.example/alias");
        let mut item = TestItem::keyed(1);
        item.aliases.push(alias.clone());
        q.put(item);

        let item = q.get(None).unwrap();
        q.task_done(&item).unwrap();

        // A later put under the alias key is a duplicate even though the
        // alias itself was never queued.
        q.put(TestItem {
            key: Some(alias),
            has_result: false,
            aliases: Vec::new(),
        });
        assert_eq!(q.status().queued, 0);
    }

    #[test]
    fn shutdown_discards_queued_items_and_unblocks_join() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(2));
        q.shutdown().unwrap();

        assert_eq!(q.status().queued, 0);
        assert!(q.is_shutdown());
        q.join(Some(Duration::from_millis(10))).unwrap();

        // Puts after shutdown are silently dropped.
        q.put(TestItem::keyed(3));
        assert_eq!(q.status().queued, 0);
    }

    #[test]
    fn join_after_shutdown_waits_for_in_flight_work() {
        let q = Arc::new(queue(None));
        q.put(TestItem::keyed(1));
        q.put(TestItem::keyed(2));

        let in_flight = q.get(None).unwrap();
        q.shutdown().unwrap();

        let joined = Arc::new(AtomicBool::new(false));
        let joiner = {
            let q = Arc::clone(&q);
            let joined = Arc::clone(&joined);
            thread::spawn(move || {
                q.join(None).unwrap();
                joined.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!joined.load(Ordering::SeqCst));

        q.task_done(&in_flight).unwrap();
        joiner.join().unwrap();
        assert!(joined.load(Ordering::SeqCst));
    }

    #[test]
    fn join_times_out_while_work_is_unfinished() {
        let q = queue(None);
        q.put(TestItem::keyed(1));
        let err = q.join(Some(Duration::from_millis(50))).err().unwrap();
        assert_eq!(err, LinkcheckError::Timeout);
    }

    #[test]
    fn would_admit_is_advisory() {
        let q = queue(Some(1));
        let item = TestItem::keyed(1);
        assert!(q.would_admit(&item));
        q.put(item);
        assert!(!q.would_admit(&TestItem::keyed(1)));
        // Budget exhausted: a fresh key is denied too.
        assert!(!q.would_admit(&TestItem::keyed(2)));
    }

    #[test]
    fn concurrent_producers_and_workers_drain_cleanly() {
        const PRODUCERS: usize = 3;
        const KEYS: usize = 200;
        const WORKERS: usize = 4;

        let q = Arc::new(queue(None));
        let finished = Arc::new(AtomicUsize::new(0));

        // Every producer puts the same key space; dedup must admit each
        // key exactly once. Workers re-enqueue one child per base item,
        // exercising the workers-are-also-producers path.
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for n in 0..KEYS {
                        q.put(TestItem::keyed(n));
                    }
                })
            })
            .collect();

        let workers: Vec<_> = (0..WORKERS)
            .map(|_| {
                let q = Arc::clone(&q);
                let finished = Arc::clone(&finished);
                thread::spawn(move || loop {
                    let item = match q.get(Some(Duration::from_millis(20))) {
                        Ok(item) => item,
                        Err(LinkcheckError::Empty) => {
                            if q.is_shutdown() {
                                break;
                            }
                            continue;
                        }
                        Err(_) => break,
                    };
                    let n: usize = item
                        .key
                        .as_ref()
                        .unwrap()
                        .result_key()
                        .rsplit('/')
                        .next()
                        .unwrap()
                        .parse()
                        .unwrap();
                    if n < KEYS {
                        q.put(TestItem::keyed(KEYS + n));
                    }
                    q.task_done(&item).unwrap();
                    finished.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        q.join(None).unwrap();
        q.shutdown().unwrap();
        for worker in workers {
            worker.join().unwrap();
        }

        // KEYS base items plus KEYS children, each accepted exactly once.
        assert_eq!(finished.load(Ordering::SeqCst), 2 * KEYS);
        let status = q.status();
        assert_eq!(status.finished, 2 * KEYS);
        assert_eq!(status.in_progress, 0);
        assert_eq!(status.queued, 0);
    }
}
