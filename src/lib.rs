//! uxcrawl: bounded authenticated crawling with headless Chrome
//!
//! Crawls a site (optionally behind a login form) under page-count, depth
//! and domain budgets, and produces a URL -> cleaned-text map plus an
//! auditable metrics summary (skip reasons, token usage, estimated cost)
//! for downstream evaluation and report tooling.

pub mod auth;
pub mod browser;
pub mod content;
pub mod crawl;
pub mod governor;
pub mod metrics;

pub use auth::{authenticate, AuthFailure, LoginConfig};
pub use content::clean_html;
pub use crawl::{crawl_site, CrawlConfig, CrawlReport, SeedOrder};
pub use metrics::{MetricsSummary, MetricsTracker, SkipReason};
