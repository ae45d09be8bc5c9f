//! Execution metrics for a crawl-and-evaluate session
//!
//! Tracks crawl outcomes (pages crawled, pages skipped and why), LLM token
//! consumption, and wall-clock session time, and projects them into a single
//! summary record consumed by report tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Model used for cost estimation when the requested model is unknown.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// Per-model pricing, USD per 1K tokens.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
    pub description: &'static str,
}

/// Static pricing table.
pub const MODEL_PRICING: &[(&str, ModelPricing)] = &[
    (
        "gpt-4o",
        ModelPricing {
            input_per_1k: 0.005,
            output_per_1k: 0.015,
            description: "Most capable model, higher cost",
        },
    ),
    (
        "gpt-4o-mini",
        ModelPricing {
            input_per_1k: 0.00015,
            output_per_1k: 0.0006,
            description: "Cost-effective model, good for most evaluations",
        },
    ),
];

/// Look up pricing for a model, falling back to [`FALLBACK_MODEL`].
pub fn pricing_for(model: &str) -> ModelPricing {
    MODEL_PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .or_else(|| MODEL_PRICING.iter().find(|(name, _)| *name == FALLBACK_MODEL))
        .map(|(_, pricing)| *pricing)
        .expect("fallback model present in pricing table")
}

/// Why a discovered URL was not crawled. Every skip carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Duplicate,
    DomainMismatch,
    MaxLimitReached,
    MaxDepthExceeded,
    NavigationError,
    ContentError,
    LoginFailed,
    AuthError,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Duplicate => "duplicate",
            SkipReason::DomainMismatch => "domain_mismatch",
            SkipReason::MaxLimitReached => "max_limit_reached",
            SkipReason::MaxDepthExceeded => "max_depth_exceeded",
            SkipReason::NavigationError => "navigation_error",
            SkipReason::ContentError => "content_error",
            SkipReason::LoginFailed => "login_failed",
            SkipReason::AuthError => "auth_error",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page-level crawl counters.
#[derive(Debug, Default, Clone)]
pub struct CrawlMetrics {
    /// The max-pages budget requested for the session.
    pub pages_requested: usize,
    pub pages_crawled: usize,
    pub pages_skipped: usize,
    /// Skipped URLs bucketed by reason; a bucket is created on first use.
    pub skip_reasons: BTreeMap<SkipReason, Vec<String>>,
    /// Successfully crawled URLs in crawl order.
    pub crawled_urls: Vec<String>,
}

/// LLM token counters. Monotonically incremented, never reset mid-session.
#[derive(Debug, Default, Clone)]
pub struct TokenMetrics {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub api_calls: u64,
}

impl TokenMetrics {
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    /// Estimated cost in USD for the given model's pricing row.
    pub fn cost(&self, model: &str) -> f64 {
        let pricing = pricing_for(model);
        // Sum the scaled products and divide once; dividing each term first
        // drifts a ulp low on the mini rates and 0.00075 mis-rounds to 0.0007
        (self.total_input_tokens as f64 * pricing.input_per_1k
            + self.total_output_tokens as f64 * pricing.output_per_1k)
            / 1000.0
    }
}

/// Session wall-clock stamps.
#[derive(Debug, Default, Clone)]
pub struct TimeMetrics {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TimeMetrics {
    /// Elapsed seconds, or 0.0 unless both stamps are set.
    pub fn elapsed_seconds(&self) -> f64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Elapsed time as zero-padded `HH:MM:SS`. Hours are unbounded.
    pub fn format_elapsed(&self) -> String {
        let total = self.elapsed_seconds() as i64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Read-only snapshot handed verbatim to report renderers.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub elapsed_time: String,
    pub elapsed_seconds: f64,
    pub pages_requested: usize,
    pub pages_crawled: usize,
    pub pages_skipped: usize,
    pub skip_reasons: BTreeMap<SkipReason, Vec<String>>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub api_calls: u64,
    pub estimated_cost_usd: f64,
    pub cost_per_page: f64,
    pub model_used: String,
}

/// Central tracker for one session. Single-writer: mutated only from the
/// crawl and authenticate call sites.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    pub crawl: CrawlMetrics,
    pub tokens: TokenMetrics,
    pub time: TimeMetrics,
    pub model: String,
}

impl MetricsTracker {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            crawl: CrawlMetrics::default(),
            tokens: TokenMetrics::default(),
            time: TimeMetrics::default(),
            model: model.into(),
        }
    }

    pub fn start_session(&mut self) {
        self.time.start_time = Some(Utc::now());
    }

    pub fn end_session(&mut self) {
        self.time.end_time = Some(Utc::now());
    }

    pub fn record_page_crawled(&mut self, url: &str) {
        self.crawl.pages_crawled += 1;
        self.crawl.crawled_urls.push(url.to_string());
    }

    pub fn record_page_skipped(&mut self, url: &str, reason: SkipReason) {
        self.crawl.pages_skipped += 1;
        self.crawl
            .skip_reasons
            .entry(reason)
            .or_default()
            .push(url.to_string());
    }

    pub fn record_api_call(&mut self, input_tokens: u64, output_tokens: u64) {
        self.tokens.total_input_tokens += input_tokens;
        self.tokens.total_output_tokens += output_tokens;
        self.tokens.api_calls += 1;
    }

    /// Project the current counters into a summary. Idempotent and
    /// side-effect free; may be called mid-session.
    pub fn summary(&self) -> MetricsSummary {
        let cost = self.tokens.cost(&self.model);
        let pages = self.crawl.pages_crawled.max(1);
        MetricsSummary {
            elapsed_time: self.time.format_elapsed(),
            elapsed_seconds: self.time.elapsed_seconds(),
            pages_requested: self.crawl.pages_requested,
            pages_crawled: self.crawl.pages_crawled,
            pages_skipped: self.crawl.pages_skipped,
            skip_reasons: self.crawl.skip_reasons.clone(),
            total_input_tokens: self.tokens.total_input_tokens,
            total_output_tokens: self.tokens.total_output_tokens,
            total_tokens: self.tokens.total_tokens(),
            api_calls: self.tokens.api_calls,
            estimated_cost_usd: round4(cost),
            cost_per_page: round4(cost / pages as f64),
            model_used: self.model.clone(),
        }
    }
}

/// Round to 4 decimal places, half away from zero.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
