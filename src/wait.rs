//! Bounded waits around driver calls.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::driver::{Context, Handle};
use crate::query::Query;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const RENDER_POLL: Duration = Duration::from_millis(50);

/// Run `fut` with an upper bound; running out of time is an ordinary
/// [`Error::Timeout`].
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("{what} after {}ms", limit.as_millis()))),
    }
}

/// Poll until the element is attached to its document.
pub async fn wait_attached(el: &Handle, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    loop {
        match el.is_attached().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(_) if start.elapsed() < timeout => {
                tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
            }
            Ok(false) => return Err(Error::Detached(el.describe())),
            Err(e) => return Err(e),
        }
    }
}

/// Attach-wait plus scroll into view. Failures are logged and ignored; the
/// action that follows reports the real problem.
pub async fn ensure_ready(el: &Handle, timeout: Duration) {
    if let Err(e) = wait_attached(el, timeout).await {
        debug!(element = %el.describe(), error = %e, "not attached before fill");
        return;
    }
    if let Err(e) = bounded(timeout, "scroll into view", el.scroll_into_view()).await {
        debug!(element = %el.describe(), error = %e, "scroll into view failed");
    }
}

/// Poll the context until any of `queries` has a visible hit. Returns false
/// once `timeout` runs out.
pub async fn wait_rendered(ctx: &Context, queries: &[Query], timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        for query in queries {
            if let Ok(hits) = ctx.query(query).await {
                if first_visible(hits).await.is_some() {
                    return true;
                }
            }
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(RENDER_POLL.min(timeout)).await;
    }
}

/// First visible element of a query result, in order.
pub async fn first_visible(candidates: Vec<Handle>) -> Option<Handle> {
    for cand in candidates {
        if let Ok(true) = cand.is_visible().await {
            return Some(cand);
        }
    }
    None
}

pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
