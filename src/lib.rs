//! shellcache - offline response cache for web app shells
//!
//! Precaches an app shell into versioned partitions, evicts stale
//! partitions on activation, and answers requests network-first for the
//! page origin and cache-first for third-party resources.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod request;
pub mod store;
pub mod ui;
pub mod worker;

pub use error::{ShellError, ShellResult};
pub use worker::{Event, EventOutcome, OfflineCacheManager};
