//! Work item types flowing through the frontier queue.
//!
//! The queue treats items as opaque: it only ever asks an item for its
//! dedup key, whether it already carries a result, and which alias keys
//! should count as seen once it completes. That contract is the
//! [`QueueItem`] trait; [`UrlTask`] is the concrete item the crawler uses.

use serde::Serialize;
use url::Url;

/// Identity of a link-check target, used for deduplication.
///
/// The key is two-part: the origin page the link was found on (if any) and
/// the normalized target URL. The target component doubles as the lookup
/// key into the shared result cache, so two pages linking to the same URL
/// are checked as distinct items but share one cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub origin: Option<String>,
    pub url: String,
}

impl CacheKey {
    pub fn new(origin: Option<String>, url: impl Into<String>) -> Self {
        Self {
            origin,
            url: url.into(),
        }
    }

    /// The secondary component: the key under which a computed result is
    /// stored in the result cache.
    pub fn result_key(&self) -> &str {
        &self.url
    }
}

/// Contract between the frontier queue and the items it manages.
///
/// All three methods must be pure and cheap: the queue calls them while
/// holding its internal lock.
pub trait QueueItem: Send + 'static {
    /// Dedup identity. Items returning `None` are never deduplicated.
    fn cache_key(&self) -> Option<&CacheKey>;

    /// True if the item already carries a computed result and only needs
    /// fast draining, not real work.
    fn has_result(&self) -> bool;

    /// Additional keys to mark as seen when this item completes, e.g. the
    /// intermediate URLs of a redirect chain collapsing onto one result.
    fn aliases(&self) -> &[CacheKey];
}

/// Outcome classification for a checked link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Valid,
    Broken(String),
}

impl CheckStatus {
    /// Short label for stats bucketing and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Valid => "valid",
            CheckStatus::Broken(_) => "broken",
        }
    }
}

/// The result of checking one URL.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub warnings: Vec<String>,
}

impl CheckResult {
    pub fn valid() -> Self {
        Self {
            status: CheckStatus::Valid,
            warnings: Vec::new(),
        }
    }

    pub fn broken(reason: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Broken(reason.into()),
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// A unit of crawl work: one URL to check, plus the metadata the queue and
/// workers need to route it.
#[derive(Debug, Clone)]
pub struct UrlTask {
    url: Url,
    cache_key: Option<CacheKey>,
    depth: usize,
    result: Option<CheckResult>,
    aliases: Vec<CacheKey>,
}

impl UrlTask {
    /// Creates a root task with no origin page.
    pub fn new(url: Url) -> Self {
        let cache_key = Some(CacheKey::new(None, url.as_str()));
        Self {
            url,
            cache_key,
            depth: 0,
            result: None,
            aliases: Vec::new(),
        }
    }

    /// Creates a task for a link discovered on `origin` at the given depth.
    pub fn discovered(url: Url, origin: &Url, depth: usize) -> Self {
        let cache_key = Some(CacheKey::new(Some(origin.to_string()), url.as_str()));
        Self {
            url,
            cache_key,
            depth,
            result: None,
            aliases: Vec::new(),
        }
    }

    /// Attaches a pre-computed result, e.g. one resolved while following a
    /// redirect chain elsewhere. Such tasks take the queue's fast-drain
    /// priority tier and are retired without further work.
    pub fn with_result(mut self, result: CheckResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn result(&self) -> Option<&CheckResult> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<CheckResult> {
        self.result.take()
    }

    /// Records alias keys discovered while processing this task, to be
    /// merged into the seen set when the task is marked done.
    pub fn add_aliases(&mut self, aliases: impl IntoIterator<Item = CacheKey>) {
        self.aliases.extend(aliases);
    }
}

impl QueueItem for UrlTask {
    fn cache_key(&self) -> Option<&CacheKey> {
        self.cache_key.as_ref()
    }

    fn has_result(&self) -> bool {
        self.result.is_some()
    }

    fn aliases(&self) -> &[CacheKey] {
        &self.aliases
    }
}
