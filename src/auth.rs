//! Login-form authentication ahead of a crawl
//!
//! Drives the login form by selector, detects success via a URL change away
//! from the login page, and reports the authenticated landing page. Failure
//! here is fatal to the session; the caller returns an empty content map.

use thiserror::Error;

use crate::browser::PageDriver;
use crate::metrics::{MetricsTracker, SkipReason};

/// Selectors probed for an error marker when the login page did not
/// redirect after submit.
const ERROR_SELECTORS: &[&str] = &[
    "[role='alert']",
    ".error",
    ".alert-danger",
    ".login-error",
    ".flash-error",
    "#error",
];

/// Settle delay after submitting the form, before reading the URL.
const POST_SUBMIT_SETTLE_MS: u64 = 500;

/// Credentials and locators for one login attempt.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub login_url: String,
    /// Page to continue to after login, when it differs from the landing
    /// page. Navigation failure here falls back to the landing page.
    pub start_url: Option<String>,
    pub username: String,
    pub password: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub timeout_ms: u64,
}

/// Why authentication did not produce a landing page.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// The form was driven but the site rejected the login: no redirect,
    /// with the detected error text (or a no-redirect note) as the cause.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// Driving the form itself failed: navigation error, selector with no
    /// match, timeout.
    #[error("authentication error: {0}")]
    AuthError(String),
}

impl AuthFailure {
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            AuthFailure::LoginFailed(_) => SkipReason::LoginFailed,
            AuthFailure::AuthError(_) => SkipReason::AuthError,
        }
    }
}

/// Authenticate and return the resolved landing page URL.
///
/// When a tracker is supplied, a failure is recorded as a skip against the
/// login URL under `login_failed` or `auth_error`.
pub async fn authenticate<P: PageDriver>(
    page: &P,
    config: &LoginConfig,
    tracker: Option<&mut MetricsTracker>,
) -> Result<String, AuthFailure> {
    let outcome = drive_login(page, config).await;
    if let (Err(failure), Some(tracker)) = (&outcome, tracker) {
        tracker.record_page_skipped(&config.login_url, failure.skip_reason());
    }
    outcome
}

async fn drive_login<P: PageDriver>(page: &P, config: &LoginConfig) -> Result<String, AuthFailure> {
    let step = |e: anyhow::Error| AuthFailure::AuthError(e.to_string());

    page.navigate(&config.login_url, config.timeout_ms)
        .await
        .map_err(step)?;
    page.fill(&config.username_selector, &config.username)
        .await
        .map_err(step)?;
    page.fill(&config.password_selector, &config.password)
        .await
        .map_err(step)?;
    page.click(&config.submit_selector).await.map_err(step)?;
    page.wait_for_idle(config.timeout_ms).await.map_err(step)?;
    page.settle(POST_SUBMIT_SETTLE_MS).await;

    let landing = page
        .current_url()
        .await
        .unwrap_or_else(|| config.login_url.clone());

    // Success criterion: we moved off the login page
    if landing == config.login_url {
        for selector in ERROR_SELECTORS {
            if let Some(text) = page.first_text(selector).await {
                return Err(AuthFailure::LoginFailed(text));
            }
        }
        return Err(AuthFailure::LoginFailed(
            "no redirect after submit".to_string(),
        ));
    }

    // Continue to the requested start page when it is distinct; the landing
    // page wins if that hop fails
    if let Some(start) = &config.start_url {
        if start != &config.login_url && start != &landing {
            if page.navigate(start, config.timeout_ms).await.is_ok() {
                return Ok(page.current_url().await.unwrap_or_else(|| start.clone()));
            }
            eprintln!("Start page unreachable, staying on {}", landing);
        }
    }

    Ok(landing)
}
