//! # Checker Module
//!
//! Defines the [`Checker`] trait, the seam where per-URL work plugs into
//! the engine.
//!
//! ## Overview
//!
//! The queue orders and tracks opaque tasks; a `Checker` implementation is
//! what actually inspects one URL — typically by fetching it — and reports
//! the outcome plus any newly discovered links. The engine guarantees that
//! `check` is never invoked while the frontier lock is held, so
//! implementations are free to block on I/O.
//!
//! This crate ships no network-backed checker; fetch logic lives in the
//! binary layers built on top of it.

use std::time::SystemTime;

use crate::item::{CacheKey, CheckResult, UrlTask};

/// Connection-level metadata about a checked page, made available to
/// content plugins after the check itself has concluded.
#[derive(Debug, Clone)]
pub struct PageInfo {
    /// Host component of the checked URL.
    pub host: String,
    /// URL scheme, e.g. `https`.
    pub scheme: String,
    /// Whether the page belongs to the site being crawled, as opposed to
    /// an external link that was only validated.
    pub internal: bool,
    /// Expiry timestamp of the server certificate, when one was presented.
    pub cert_not_after: Option<SystemTime>,
    /// Negotiated cipher suite name, when known.
    pub cipher: Option<String>,
}

/// Everything a checker learned from processing one task.
pub struct CheckOutcome {
    /// The verdict for the checked URL.
    pub result: CheckResult,
    /// Links discovered on the page, to be offered to the frontier.
    pub discovered: Vec<UrlTask>,
    /// Keys that resolve to the same result as this task, e.g. every hop
    /// of a followed redirect chain.
    pub aliases: Vec<CacheKey>,
    /// Connection metadata for content plugins, when available.
    pub page: Option<PageInfo>,
}

impl CheckOutcome {
    /// An outcome carrying only a verdict: nothing discovered, no aliases,
    /// no page metadata.
    pub fn of(result: CheckResult) -> Self {
        CheckOutcome {
            result,
            discovered: Vec::new(),
            aliases: Vec::new(),
            page: None,
        }
    }
}

/// Defines the contract for per-URL check logic.
pub trait Checker: Send + Sync + 'static {
    /// Checks a single URL and reports the outcome.
    ///
    /// Called from worker threads; may block. Must not touch the frontier
    /// directly — discovered links are returned in the outcome and the
    /// engine offers them to the queue.
    fn check(&self, task: &UrlTask) -> CheckOutcome;
}
