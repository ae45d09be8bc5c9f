//! crawl command: budget-, depth- and domain-bounded site traversal
//!
//! Seeds are fetched first in the order given, then organic discovery runs
//! from the entry URL with an explicit frontier that reproduces depth-first,
//! link-enumeration order. Every candidate URL gets exactly one outcome:
//! crawled, or skipped with a single reason.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use url::Url;

use crate::auth::{authenticate, LoginConfig};
use crate::browser::{BrowserPool, PageDriver};
use crate::content::clean_html;
use crate::metrics::{MetricsSummary, MetricsTracker, SkipReason};

/// Default traversal bound: three levels (0, 1, 2).
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Settle delay after each successful navigation.
const SETTLE_MS: u64 = 300;

#[derive(Args)]
pub struct CrawlArgs {
    /// Entry URL for organic discovery (omit to fetch --seed URLs only)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Login page URL; enables the authentication step
    #[arg(long)]
    pub login_url: Option<String>,

    /// Login username
    #[arg(long, env = "UXCRAWL_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "UXCRAWL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// CSS selector for the username field
    #[arg(long, default_value = "#username")]
    pub username_selector: String,

    /// CSS selector for the password field
    #[arg(long, default_value = "#password")]
    pub password_selector: String,

    /// CSS selector for the submit button
    #[arg(long, default_value = "button[type='submit']")]
    pub submit_selector: String,

    /// URL to fetch ahead of organic discovery (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    pub seeds: Vec<String>,

    /// Budget: maximum pages to crawl
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: u32,

    /// Maximum link depth from the entry URL
    #[arg(long, default_value = "2")]
    pub max_depth: u32,

    /// Timeout per navigation in milliseconds
    #[arg(long, default_value = "30000")]
    pub timeout: u64,

    /// Crawl the entry URL before the seed list
    #[arg(long)]
    pub entry_first: bool,

    /// Model key for cost estimation
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// Output format: json (default) or yaml
    #[arg(long, short, default_value = "json")]
    pub format: String,
}

/// Whether explicit seeds are fetched before or after organic discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedOrder {
    #[default]
    SeedsFirst,
    EntryFirst,
}

/// Bounds and inputs for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// URLs fetched with priority, in order, each at depth 0. Seeds are
    /// leaf fetches: no links are discovered from them.
    pub seeds: Vec<String>,
    /// Root of organic discovery, at depth 0.
    pub entry_url: Option<String>,
    /// Authority (host, plus port when present) bounding the crawl.
    pub base_domain: String,
    pub max_pages: usize,
    pub max_depth: usize,
    pub timeout_ms: u64,
    pub settle_ms: u64,
    pub seed_order: SeedOrder,
}

impl CrawlConfig {
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            seeds: Vec::new(),
            entry_url: None,
            base_domain: base_domain.into(),
            max_pages: 50,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout_ms: 30_000,
            settle_ms: SETTLE_MS,
            seed_order: SeedOrder::SeedsFirst,
        }
    }
}

/// Mutable state for one crawl, owned by the crawler for the session's
/// lifetime. The visited set only grows; the content map never exceeds
/// the page budget.
struct CrawlSession {
    visited: HashSet<String>,
    content: BTreeMap<String, String>,
    base_domain: String,
    max_pages: usize,
    max_depth: usize,
}

impl CrawlSession {
    fn new(config: &CrawlConfig) -> Self {
        Self {
            visited: HashSet::new(),
            content: BTreeMap::new(),
            base_domain: config.base_domain.clone(),
            max_pages: config.max_pages,
            max_depth: config.max_depth,
        }
    }

    /// Admission check, fixed precedence, short-circuiting at the first
    /// failure: budget, duplicate, depth, domain.
    fn admit(&self, url: &str, depth: usize) -> Result<(), SkipReason> {
        if self.content.len() >= self.max_pages {
            return Err(SkipReason::MaxLimitReached);
        }
        if self.visited.contains(url) {
            return Err(SkipReason::Duplicate);
        }
        if depth > self.max_depth {
            return Err(SkipReason::MaxDepthExceeded);
        }
        match authority_of(url) {
            Ok(authority) if authority == self.base_domain => Ok(()),
            _ => Err(SkipReason::DomainMismatch),
        }
    }

    fn budget_full(&self) -> bool {
        self.content.len() >= self.max_pages
    }
}

/// Authority of a URL: host, plus the port when one is present.
pub fn authority_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("URL has no host: {}", url))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Discovered links keep only web schemes; mailto:/javascript: and
/// unparseable hrefs are dropped before any policy decision.
fn crawlable_scheme(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Crawl seeds and entry URL under the configured bounds, reporting every
/// outcome to the tracker. Per-URL failures never abort the session.
pub async fn crawl_site<P: PageDriver>(
    page: &P,
    config: &CrawlConfig,
    tracker: &mut MetricsTracker,
) -> BTreeMap<String, String> {
    let mut session = CrawlSession::new(config);

    match config.seed_order {
        SeedOrder::SeedsFirst => {
            fetch_seeds(page, config, &mut session, tracker).await;
            traverse(page, config, &mut session, tracker).await;
        }
        SeedOrder::EntryFirst => {
            traverse(page, config, &mut session, tracker).await;
            fetch_seeds(page, config, &mut session, tracker).await;
        }
    }

    session.content
}

async fn fetch_seeds<P: PageDriver>(
    page: &P,
    config: &CrawlConfig,
    session: &mut CrawlSession,
    tracker: &mut MetricsTracker,
) {
    for seed in &config.seeds {
        visit(page, config, session, tracker, seed, 0, false).await;
    }
}

async fn traverse<P: PageDriver>(
    page: &P,
    config: &CrawlConfig,
    session: &mut CrawlSession,
    tracker: &mut MetricsTracker,
) {
    let Some(entry) = &config.entry_url else {
        return;
    };

    let mut frontier: Vec<(String, usize)> = vec![(entry.clone(), 0)];
    while let Some((url, depth)) = frontier.pop() {
        let children = visit(page, config, session, tracker, &url, depth, true).await;
        // Reversed so the first link on the page is processed next
        for child in children.into_iter().rev() {
            frontier.push((child, depth + 1));
        }
    }
}

/// Attempt one URL: policy check, navigate, extract, store. Returns the
/// links to descend into (empty for seeds, skips and failures).
async fn visit<P: PageDriver>(
    page: &P,
    config: &CrawlConfig,
    session: &mut CrawlSession,
    tracker: &mut MetricsTracker,
    url: &str,
    depth: usize,
    discover: bool,
) -> Vec<String> {
    if let Err(reason) = session.admit(url, depth) {
        tracker.record_page_skipped(url, reason);
        return Vec::new();
    }
    session.visited.insert(url.to_string());

    eprintln!("  -> {}", truncate(url, 60));

    if let Err(e) = page.navigate(url, config.timeout_ms).await {
        eprintln!("Navigation error for {}: {}", url, e);
        tracker.record_page_skipped(url, SkipReason::NavigationError);
        return Vec::new();
    }
    page.settle(config.settle_ms).await;

    let html = match page.content().await {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Content extraction error at {}: {}", url, e);
            tracker.record_page_skipped(url, SkipReason::ContentError);
            return Vec::new();
        }
    };

    session.content.insert(url.to_string(), clean_html(&html));
    tracker.record_page_crawled(url);

    if !discover || session.budget_full() {
        return Vec::new();
    }

    match page.link_hrefs().await {
        Ok(links) => links.into_iter().filter(|l| crawlable_scheme(l)).collect(),
        Err(e) => {
            // The page itself is kept; we just stop descending from it
            eprintln!("Link extraction error at {}: {}", url, e);
            Vec::new()
        }
    }
}

/// Content map plus metrics snapshot, handed to evaluation/report tooling.
#[derive(Debug, Serialize)]
pub struct CrawlReport {
    pub pages: BTreeMap<String, String>,
    pub metrics: MetricsSummary,
}

/// Run the crawl command
pub async fn run_crawl(args: CrawlArgs) -> Result<()> {
    // Crawl scope comes from the login page when there is one, else the
    // entry URL, else the first seed
    let Some(scope_url) = args
        .login_url
        .clone()
        .or_else(|| args.url.clone())
        .or_else(|| args.seeds.first().cloned())
    else {
        eprintln!("Usage:");
        eprintln!("  uxcrawl crawl <URL>                          Crawl from an entry URL");
        eprintln!("  uxcrawl crawl <URL> --login-url <URL> ...    Authenticate, then crawl");
        eprintln!("  uxcrawl crawl --seed <URL> [--seed <URL>]    Fetch explicit URLs only");
        std::process::exit(1);
    };
    let base_domain = authority_of(&scope_url)?;

    let mut tracker = MetricsTracker::new(&args.model);
    tracker.start_session();
    tracker.crawl.pages_requested = args.max_pages as usize;

    // Single browsing context for the whole session
    let pool = BrowserPool::new(1).await?;
    let page = pool.new_page().await?;

    let mut entry_url = args.url.clone();
    if let Some(login_url) = &args.login_url {
        let (Some(username), Some(password)) = (&args.username, &args.password) else {
            eprintln!("--login-url requires --username and --password");
            std::process::exit(1);
        };

        eprintln!("Authenticating at {}...", truncate(login_url, 60));
        let login = LoginConfig {
            login_url: login_url.clone(),
            start_url: args.url.clone(),
            username: username.clone(),
            password: password.clone(),
            username_selector: args.username_selector.clone(),
            password_selector: args.password_selector.clone(),
            submit_selector: args.submit_selector.clone(),
            timeout_ms: args.timeout,
        };

        match authenticate(&page, &login, Some(&mut tracker)).await {
            Ok(landing) => {
                eprintln!("Authenticated, landing on {}", truncate(&landing, 60));
                entry_url = Some(landing);
            }
            Err(failure) => {
                // Fatal to the session: report with an empty content map
                eprintln!("Authentication failed: {}", failure);
                tracker.end_session();
                let report = CrawlReport {
                    pages: BTreeMap::new(),
                    metrics: tracker.summary(),
                };
                print_report(&report, &args.format)?;
                pool.close().await?;
                std::process::exit(1);
            }
        }
    }

    let config = CrawlConfig {
        seeds: args.seeds.clone(),
        entry_url,
        base_domain,
        max_pages: args.max_pages as usize,
        max_depth: args.max_depth as usize,
        timeout_ms: args.timeout,
        settle_ms: SETTLE_MS,
        seed_order: if args.entry_first {
            SeedOrder::EntryFirst
        } else {
            SeedOrder::SeedsFirst
        },
    };

    let pages = crawl_site(&page, &config, &mut tracker).await;
    tracker.end_session();

    let report = CrawlReport {
        pages,
        metrics: tracker.summary(),
    };
    print_report(&report, &args.format)?;

    pool.close().await?;

    eprintln!(
        "Done: {} crawled, {} skipped in {}",
        report.metrics.pages_crawled, report.metrics.pages_skipped, report.metrics.elapsed_time
    );

    Ok(())
}

fn print_report(report: &CrawlReport, format: &str) -> Result<()> {
    let output = match format {
        "yaml" | "yml" => serde_yaml::to_string(report)?,
        _ => serde_json::to_string_pretty(report)?,
    };
    println!("{}", output);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}
