//! Headless Chrome browser management via chromiumoxide

use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::governor;

/// Browser pool configuration
pub struct BrowserPool {
    browser: Browser,
    semaphore: Arc<Semaphore>,
    user_agent: String,
}

impl BrowserPool {
    /// Create a new browser pool with concurrency limit
    pub async fn new(concurrency: usize) -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--headless=new")
            .build()
            .map_err(|e| anyhow::anyhow!("Browser config error: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome. Is Chrome/Chromium installed?")?;

        // Spawn handler in background
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        })
    }

    /// Get a new page with the sub-resource governor installed
    pub async fn new_page(&self) -> Result<BrowserPage> {
        let permit = self.semaphore.clone().acquire_owned().await?;
        let page = self.browser.new_page("about:blank").await?;

        // Set user agent
        page.execute(
            chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams::new(
                &self.user_agent,
            ),
        )
        .await?;

        governor::install(&page).await?;

        Ok(BrowserPage {
            page,
            _permit: permit,
        })
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

/// A browser page with automatic permit release
pub struct BrowserPage {
    page: Page,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// Capabilities the crawler and the authentication navigator need from a
/// live page. Selectors are opaque locator expressions resolved by the
/// implementation; tests supply scripted fakes.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigate to a URL within a bounded deadline.
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// The URL the page is at right now (after redirects), if known.
    async fn current_url(&self) -> Option<String>;

    /// Rendered page HTML.
    async fn content(&self) -> Result<String>;

    /// Absolute `href` of every anchor on the page, in document order.
    async fn link_hrefs(&self) -> Result<Vec<String>>;

    /// Type a value into the element matched by the selector.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Click the element matched by the selector.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait (bounded) for any in-flight navigation to finish. A page that
    /// is already settled is not an error.
    async fn wait_for_idle(&self, timeout_ms: u64) -> Result<()>;

    /// Explicit settle delay after navigation.
    async fn settle(&self, ms: u64);

    /// Trimmed inner text of the first element matched by the selector,
    /// if any.
    async fn first_text(&self, selector: &str) -> Option<String>;
}

impl PageDriver for BrowserPage {
    async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<()> {
        let nav =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;
        match nav {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(anyhow::anyhow!("Navigation failed: {}", e)),
            Err(_) => Err(anyhow::anyhow!("Navigation timeout after {}ms", timeout_ms)),
        }
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to get page content")
    }

    async fn link_hrefs(&self) -> Result<Vec<String>> {
        let hrefs: Vec<String> = self
            .page
            .evaluate("Array.from(document.querySelectorAll('a[href]')).map(a => a.href)")
            .await
            .context("Link enumeration failed")?
            .into_value()
            .context("Link enumeration returned a non-string list")?;
        Ok(hrefs)
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches selector: {}", selector))?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches selector: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn wait_for_idle(&self, timeout_ms: u64) -> Result<()> {
        // Timing out here just means no navigation was pending
        let _ = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.wait_for_navigation(),
        )
        .await;
        Ok(())
    }

    async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    async fn first_text(&self, selector: &str) -> Option<String> {
        let element = self.page.find_element(selector).await.ok()?;
        element
            .inner_text()
            .await
            .ok()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
