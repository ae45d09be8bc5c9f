//! Sub-resource governor: abort non-essential requests during navigation
//!
//! Images, media, fonts and stylesheets add latency and load cost without
//! contributing evaluable text, so they are aborted at the CDP fetch layer.
//! Installed once per page before any navigation.

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;

/// Pure abort policy for a classified sub-resource request.
pub fn should_abort(resource_type: &ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::Image | ResourceType::Media | ResourceType::Font | ResourceType::Stylesheet
    )
}

/// Enable request interception on the page and spawn the paused-request
/// handler applying [`should_abort`].
pub async fn install(page: &Page) -> Result<()> {
    page.execute(EnableParams::default()).await?;
    let mut requests = page.event_listener::<EventRequestPaused>().await?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            let verdict = if should_abort(&event.resource_type) {
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::Aborted,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };
            // Page closed underneath us, session is over
            if verdict.is_err() {
                break;
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_abort_heavy_resources() {
        assert!(should_abort(&ResourceType::Image));
        assert!(should_abort(&ResourceType::Media));
        assert!(should_abort(&ResourceType::Font));
        assert!(should_abort(&ResourceType::Stylesheet));
    }

    #[test]
    fn test_should_continue_essential_resources() {
        assert!(!should_abort(&ResourceType::Document));
        assert!(!should_abort(&ResourceType::Script));
        assert!(!should_abort(&ResourceType::Xhr));
        assert!(!should_abort(&ResourceType::Fetch));
    }
}
