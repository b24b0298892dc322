//! Ordered fallback tiers evaluated lazily.
//!
//! Each tier is a future that has not been polled yet. [`Ladder::run`] awaits
//! them one at a time and stops at the first `Ok(true)`; `Ok(false)` means
//! "not applicable here" and an error means "this tier broke", both of which
//! move on to the next tier.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::Result;

pub(crate) struct Ladder<'a> {
    what: String,
    tiers: Vec<(&'static str, BoxFuture<'a, Result<bool>>)>,
}

impl<'a> Ladder<'a> {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            tiers: Vec::new(),
        }
    }

    pub fn tier<F>(mut self, name: &'static str, fut: F) -> Self
    where
        F: Future<Output = Result<bool>> + Send + 'a,
    {
        self.tiers.push((name, Box::pin(fut)));
        self
    }

    /// Name of the tier that succeeded, if any.
    pub async fn run(self) -> Option<&'static str> {
        let what = self.what;
        for (name, fut) in self.tiers {
            match fut.await {
                Ok(true) => {
                    debug!(field = %what, tier = name, "tier succeeded");
                    return Some(name);
                }
                Ok(false) => debug!(field = %what, tier = name, "tier not applicable"),
                Err(e) => debug!(field = %what, tier = name, error = %e, transient = e.is_transient(), "tier failed"),
            }
        }
        None
    }
}
