//! # Statistics Module
//!
//! Collects metrics about a crawl session for progress display and final
//! reporting.
//!
//! ## Overview
//!
//! The `StatCollector` tracks how many URLs were enqueued and discovered,
//! how checks concluded, and how much work was satisfied straight from the
//! result cache. Counters are atomic so worker threads update them without
//! coordination; reads are approximate snapshots, consistent enough for
//! monitoring but never for correctness decisions.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

// A snapshot of the current statistics, used for reporting. Keeps the
// export/display paths free of repeated atomic loads.
struct StatsSnapshot {
    urls_enqueued: usize,
    urls_discovered: usize,
    checks_valid: usize,
    checks_broken: usize,
    warnings_emitted: usize,
    drained_from_cache: usize,
    status_counts: HashMap<String, usize>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn checks_total(&self) -> usize {
        self.checks_valid + self.checks_broken
    }

    fn checks_per_second(&self) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs();
        if total_seconds > 0 {
            self.checks_total() as f64 / total_seconds as f64
        } else {
            0.0
        }
    }
}

/// Collects and stores statistics about a crawl session.
#[derive(Debug, serde::Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    start_time: Instant,

    pub urls_enqueued: AtomicUsize,
    pub urls_discovered: AtomicUsize,
    pub checks_valid: AtomicUsize,
    pub checks_broken: AtomicUsize,
    pub warnings_emitted: AtomicUsize,
    pub drained_from_cache: AtomicUsize,

    // Outcome label -> count, e.g. "valid", "broken".
    pub status_counts: dashmap::DashMap<String, usize>,
}

impl StatCollector {
    pub fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            urls_enqueued: AtomicUsize::new(0),
            urls_discovered: AtomicUsize::new(0),
            checks_valid: AtomicUsize::new(0),
            checks_broken: AtomicUsize::new(0),
            warnings_emitted: AtomicUsize::new(0),
            drained_from_cache: AtomicUsize::new(0),
            status_counts: dashmap::DashMap::new(),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut status_counts = HashMap::new();
        for entry in self.status_counts.iter() {
            let (key, value) = entry.pair();
            status_counts.insert(key.clone(), *value);
        }

        StatsSnapshot {
            urls_enqueued: self.urls_enqueued.load(Ordering::SeqCst),
            urls_discovered: self.urls_discovered.load(Ordering::SeqCst),
            checks_valid: self.checks_valid.load(Ordering::SeqCst),
            checks_broken: self.checks_broken.load(Ordering::SeqCst),
            warnings_emitted: self.warnings_emitted.load(Ordering::SeqCst),
            drained_from_cache: self.drained_from_cache.load(Ordering::SeqCst),
            status_counts,
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    /// Records a URL offered to the frontier by the caller.
    pub(crate) fn increment_urls_enqueued(&self) {
        self.urls_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a URL discovered on a checked page.
    pub(crate) fn increment_urls_discovered(&self) {
        self.urls_discovered.fetch_add(1, Ordering::SeqCst);
    }

    /// Records a concluded check by its outcome label.
    pub(crate) fn record_check(&self, label: &str, valid: bool, warnings: usize) {
        if valid {
            self.checks_valid.fetch_add(1, Ordering::SeqCst);
        } else {
            self.checks_broken.fetch_add(1, Ordering::SeqCst);
        }
        self.warnings_emitted.fetch_add(warnings, Ordering::SeqCst);
        *self.status_counts.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Records an item retired straight from the queue's fast-drain tier.
    pub(crate) fn increment_drained_from_cache(&self) {
        self.drained_from_cache.fetch_add(1, Ordering::SeqCst);
    }

    /// Converts the current statistics into a JSON string.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Converts the current statistics into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {:?}", snapshot.elapsed_duration)?;
        writeln!(f, "  speed    : {:.2} checks/s", snapshot.checks_per_second())?;
        writeln!(
            f,
            "  urls     : enqueued: {}, discovered: {}",
            snapshot.urls_enqueued, snapshot.urls_discovered
        )?;
        writeln!(
            f,
            "  checks   : valid: {}, broken: {}, from_cache: {}, warnings: {}",
            snapshot.checks_valid,
            snapshot.checks_broken,
            snapshot.drained_from_cache,
            snapshot.warnings_emitted
        )?;

        let status_string = if snapshot.status_counts.is_empty() {
            "none".to_string()
        } else {
            snapshot
                .status_counts
                .iter()
                .map(|(label, count)| format!("{label}: {count}"))
                .collect::<Vec<String>>()
                .join(", ")
        };
        writeln!(f, "  outcomes : {status_string}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_check_buckets_by_label() {
        let stats = StatCollector::new();
        stats.record_check("valid", true, 0);
        stats.record_check("valid", true, 2);
        stats.record_check("broken", false, 0);

        assert_eq!(stats.checks_valid.load(Ordering::SeqCst), 2);
        assert_eq!(stats.checks_broken.load(Ordering::SeqCst), 1);
        assert_eq!(stats.warnings_emitted.load(Ordering::SeqCst), 2);
        assert_eq!(*stats.status_counts.get("valid").unwrap(), 2);
    }

    #[test]
    fn exports_to_json() {
        let stats = StatCollector::new();
        stats.increment_urls_enqueued();
        let json = stats.to_json_string_pretty().unwrap();
        assert!(json.contains("\"urls_enqueued\": 1"));
    }
}
