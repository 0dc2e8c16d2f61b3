//! A "prelude" for users of the `linkcheck-core` crate.
//!
//! This prelude re-exports the most commonly used traits and structs so
//! that they can be easily imported.
//!
//! # Example
//!
//! ```
//! use linkcheck_core::prelude::*;
//! ```

pub use crate::{
    // Core structs
    Crawler,
    CrawlerBuilder,
    UrlQueue,
    UrlTask,
    // Core traits
    Checker,
    ContentPlugin,
    QueueItem,
    ResultCache,
    // Common data types
    CheckOutcome,
    CheckResult,
    CheckStatus,
    LinkcheckError,
};
