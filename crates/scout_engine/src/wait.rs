use std::future::Future;
use std::time::Duration;

use scraper::{Html, Selector};
use tokio::time::Instant;

use crate::page::{Page, PageError};

/// Polls `check` until it reports true or `timeout` elapses. The predicate is
/// always evaluated at least once. Returns whether it was satisfied.
pub async fn wait_until<F, Fut>(
    mut check: F,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, PageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, PageError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        let step = poll.max(Duration::from_millis(1)).min(deadline - now);
        tokio::time::sleep(step).await;
    }
}

pub fn document_has(html: &str, selector: &Selector) -> bool {
    Html::parse_document(html).select(selector).next().is_some()
}

/// Waits for any element matching `selector` to appear in the page.
pub async fn wait_for_selector<P: Page + ?Sized>(
    page: &P,
    selector: &Selector,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, PageError> {
    wait_until(
        || async move {
            let html = page.html().await?;
            Ok(document_has(&html, selector))
        },
        timeout,
        poll,
    )
    .await
}

/// Plain settle delay; zero returns immediately.
pub async fn settle(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
