//! # Content Plugin Module
//!
//! Plugins inspect checked pages and attach warnings to their results,
//! without influencing the check verdict or the crawl frontier.
//!
//! ## Overview
//!
//! A [`PluginManager`] holds the plugins registered for a crawl session
//! and runs them in registration order against every page for which the
//! checker produced connection metadata. Plugins see the task, the page
//! metadata, and the mutable result; they never see the queue.
//!
//! The built-in [`SslCertCheck`] plugin warns about server certificates
//! that are expired or expire within a configurable window.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::checker::PageInfo;
use crate::error::{LinkcheckError, Result};
use crate::item::{CheckResult, CheckStatus, UrlTask};

/// A content inspection hook run after a page has been checked.
pub trait ContentPlugin: Send + Sync {
    /// Stable name for logging.
    fn name(&self) -> &'static str;

    /// Inspects one checked page, appending warnings to `result` as
    /// needed. Runs on worker threads; must not block for long.
    fn inspect(&self, task: &UrlTask, page: &PageInfo, result: &mut CheckResult);
}

/// Runs all registered plugins, in registration order, against a page.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn ContentPlugin>>,
}

impl PluginManager {
    pub fn new(plugins: Vec<Box<dyn ContentPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn inspect(&self, task: &UrlTask, page: &PageInfo, result: &mut CheckResult) {
        for plugin in &self.plugins {
            trace!(plugin = plugin.name(), url = %task.url(), "running content plugin");
            plugin.inspect(task, page, result);
        }
    }
}

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Warns when an internal https page presents a certificate that is
/// expired or close to expiring.
///
/// Only pages whose check concluded valid are inspected; a broken page
/// keeps its verdict unmuddied by certificate warnings. Each host is
/// inspected at most once per session to avoid repeating the same warning
/// for every page on a site.
pub struct SslCertCheck {
    warn_within: Duration,
    checked_hosts: Mutex<HashSet<String>>,
}

impl SslCertCheck {
    /// Default warning window, in days, before expiry.
    pub const DEFAULT_WARN_DAYS: u64 = 30;

    pub fn new() -> Self {
        Self {
            warn_within: Duration::from_secs(Self::DEFAULT_WARN_DAYS * SECONDS_PER_DAY),
            checked_hosts: Mutex::new(HashSet::new()),
        }
    }

    /// Creates a check that warns when a certificate expires within
    /// `warn_days` days. Zero days is a configuration error.
    pub fn with_warn_days(warn_days: u64) -> Result<Self> {
        if warn_days == 0 {
            return Err(LinkcheckError::ConfigurationError(
                "certificate warning window must be at least one day".to_string(),
            ));
        }
        Ok(Self {
            warn_within: Duration::from_secs(warn_days * SECONDS_PER_DAY),
            checked_hosts: Mutex::new(HashSet::new()),
        })
    }

    fn check_expiry(&self, page: &PageInfo, result: &mut CheckResult) {
        let Some(not_after) = page.cert_not_after else {
            self.add_warning(page, result, "certificate carries no expiry information");
            return;
        };
        match not_after.duration_since(SystemTime::now()) {
            Err(_) => {
                self.add_warning(page, result, "certificate has expired");
            }
            Ok(valid_for) if valid_for < self.warn_within => {
                let days = valid_for.as_secs() / SECONDS_PER_DAY;
                self.add_warning(
                    page,
                    result,
                    format!("certificate is only valid for {days} more day(s)"),
                );
            }
            Ok(_) => {}
        }
    }

    fn add_warning(&self, page: &PageInfo, result: &mut CheckResult, msg: impl Into<String>) {
        let msg = msg.into();
        debug!(host = %page.host, "{msg}");
        match &page.cipher {
            Some(cipher) => result.add_warning(format!("SSL warning: {msg}. Cipher {cipher}.")),
            None => result.add_warning(format!("SSL warning: {msg}.")),
        }
    }
}

impl Default for SslCertCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentPlugin for SslCertCheck {
    fn name(&self) -> &'static str {
        "ssl-cert-check"
    }

    fn inspect(&self, _task: &UrlTask, page: &PageInfo, result: &mut CheckResult) {
        if !page.internal || page.scheme != "https" {
            return;
        }
        // Broken pages keep their verdict as the story; no certificate
        // warnings, and the host's slot stays available for a valid page.
        if !matches!(result.status, CheckStatus::Valid) {
            return;
        }
        // One inspection per host per session.
        if !self.checked_hosts.lock().insert(page.host.clone()) {
            return;
        }
        self.check_expiry(page, result);
    }
}
