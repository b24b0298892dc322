//! Capability surface consumed from a browser-automation driver.
//!
//! Everything the engine does to a page goes through these traits. The
//! Chromium binding lives in [`crate::page`] and [`crate::element`]; tests
//! provide an in-memory document.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::query::{Query, Selector};

pub type Context = Arc<dyn SearchContext>;
pub type Handle = Arc<dyn ElementHandle>;

/// A page with zero or more embedded frames.
#[async_trait]
pub trait Document: Send + Sync {
    /// The top-level document.
    fn main_context(&self) -> Context;

    /// Number of embedded frames currently attached, in document order.
    async fn frame_count(&self) -> Result<usize>;

    /// Open the frame at `index`. Cross-origin or detached frames fail.
    async fn frame(&self, index: usize) -> Result<Context>;
}

/// A queryable document scope: the main page or one frame.
#[async_trait]
pub trait SearchContext: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    async fn query(&self, query: &Query) -> Result<Vec<Handle>>;
}

/// One element inside a [`SearchContext`].
///
/// State reads always hit the live document; callers must not cache them
/// across actions.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    fn describe(&self) -> String;

    async fn tag_name(&self) -> Result<String>;
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    async fn is_attached(&self) -> Result<bool>;
    /// Attached, non-empty rendered box, not `display:none` or
    /// `visibility:hidden`.
    async fn is_visible(&self) -> Result<bool>;
    async fn is_checked(&self) -> Result<bool>;
    async fn inner_text(&self) -> Result<String>;
    async fn input_value(&self) -> Result<String>;

    async fn scroll_into_view(&self) -> Result<()>;
    async fn click(&self) -> Result<()>;
    /// Empty the control's current content.
    async fn clear(&self) -> Result<()>;
    /// Send `text` as individual key events to the focused element.
    async fn type_text(&self, text: &str) -> Result<()>;
    async fn press_key(&self, key: &str) -> Result<()>;
    /// Assign the value directly and fire `input`/`change`.
    async fn set_value(&self, value: &str) -> Result<()>;
    /// Select the `<option>` whose value is exactly `value`.
    async fn select_option(&self, value: &str) -> Result<()>;

    /// Query descendants of this element.
    async fn query(&self, query: &Query) -> Result<Vec<Handle>>;
    /// Nearest inclusive ancestor matching any selector.
    async fn closest(&self, selectors: &[Selector]) -> Result<Option<Handle>>;
}

/// Where an option or radio search runs: a whole context (options rendered
/// in a portal) or below one element.
#[derive(Clone)]
pub enum Scope {
    Context(Context),
    Element(Handle),
}

impl Scope {
    pub async fn query(&self, query: &Query) -> Result<Vec<Handle>> {
        match self {
            Scope::Context(ctx) => ctx.query(query).await,
            Scope::Element(el) => el.query(query).await,
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Context(ctx) => write!(f, "Scope::Context({})", ctx.describe()),
            Scope::Element(el) => write!(f, "Scope::Element({})", el.describe()),
        }
    }
}
