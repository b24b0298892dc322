//! Enumerate the searchable contexts of a page: the main document, then each
//! embedded frame in document order.

use std::time::Duration;

use tracing::warn;

use crate::driver::{Context, Document};
use crate::wait::bounded;

/// Fresh on every call; frames attach and detach while the page runs.
/// Frames that refuse access or do not answer within `frame_timeout` are
/// skipped.
pub async fn enumerate(doc: &dyn Document, frame_timeout: Duration) -> Vec<Context> {
    let mut contexts = vec![doc.main_context()];

    let count = match bounded(frame_timeout, "frame count", doc.frame_count()).await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "could not list frames, searching the main document only");
            return contexts;
        }
    };

    for index in 0..count {
        match bounded(frame_timeout, "frame", doc.frame(index)).await {
            Ok(ctx) => contexts.push(ctx),
            Err(e) => warn!(frame = index, error = %e, "skipping frame"),
        }
    }
    contexts
}
