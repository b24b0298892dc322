//! Widget-specific fill strategies.
//!
//! Every filler wraps one located element and the context it was found in.
//! Fillers never cache page state between steps: each read goes back to the
//! driver, because the site's own scripts keep mutating the document.

mod checkbox;
mod combobox;
mod custom_combobox;
mod ladder;
mod radio;
mod select;
mod text;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::classifier::WidgetType;
use crate::config::EngineConfig;
use crate::driver::{Context, Handle};
use crate::error::Result;
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector, TextMatch};
use crate::wait::{bounded, ensure_ready, first_visible, settle, wait_rendered};

pub use checkbox::CheckboxFiller;
pub use combobox::ComboboxFiller;
pub use custom_combobox::CustomComboboxFiller;
pub use radio::{normalize_choice, RadioFiller};
pub use select::SelectFiller;
pub use text::{DirectFiller, TextFiller};

pub(crate) use ladder::Ladder;

#[async_trait]
pub trait Filler: Send + Sync {
    fn widget(&self) -> WidgetType;

    /// Drive the control towards `value`.
    ///
    /// `Ok` carries what happened; `Err` means every tier was tried and the
    /// control could not be set (or, for radios, no option matched).
    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome>;
}

/// Filler for the not-found sentinel: always a no-op.
pub struct NotFoundFiller;

#[async_trait]
impl Filler for NotFoundFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::NotFound
    }

    async fn fill(&self, _value: &FieldValue) -> Result<FillOutcome> {
        Ok(FillOutcome::absent())
    }
}

/// The element a filler acts on plus where it lives.
#[derive(Clone)]
pub struct FillTarget {
    pub key: String,
    pub context: Context,
    pub element: Handle,
    pub config: Arc<EngineConfig>,
}

impl FillTarget {
    /// Attach-wait and scroll into view; never fails.
    pub async fn ready(&self) {
        ensure_ready(&self.element, self.config.ready_timeout).await;
    }

    /// Bound one driver interaction by the action timeout.
    pub async fn act<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        bounded(self.config.action_timeout, what, fut).await
    }

    /// Disabled, read-only or `aria-disabled` controls are reported as
    /// present but not filled.
    pub async fn is_blocked(&self) -> bool {
        for name in ["disabled", "readonly"] {
            if let Ok(Some(_)) = self.element.attribute(name).await {
                return true;
            }
        }
        matches!(
            self.element.attribute("aria-disabled").await,
            Ok(Some(v)) if v.trim().eq_ignore_ascii_case("true")
        )
    }

    pub async fn tag(&self) -> String {
        self.element
            .tag_name()
            .await
            .map(|t| t.to_lowercase())
            .unwrap_or_default()
    }

    /// First editable below the control, or the control itself when it is an
    /// input.
    pub async fn editable(&self) -> Option<Handle> {
        let inner = Query::select(vec![
            Selector::tag("input").attr_not("type", TextMatch::fold("hidden")),
            Selector::tag("textarea"),
            Selector::any().attr_eq("contenteditable", "true"),
        ]);
        if let Ok(hits) = self.element.query(&inner).await {
            if let Some(el) = first_visible(hits).await {
                return Some(el);
            }
        }
        if self.tag().await == "input" {
            return Some(self.element.clone());
        }
        None
    }

    /// Wait for the popup opened by the last click or keystroke to show
    /// options, a menu or a grouped panel.
    pub async fn await_options(&self) -> bool {
        let popup = [
            Query::select(vec![
                Selector::any().role_attr("option"),
                Selector::any().role_attr("menuitem"),
            ]),
            Query::has(
                vec![Selector::any().role_attr("listbox")],
                Query::role("group", None),
            ),
        ];
        let rendered = wait_rendered(&self.context, &popup, self.config.options_timeout).await;
        if !rendered {
            debug!(field = %self.key, "no options rendered");
        }
        settle(self.config.settle_delay).await;
        rendered
    }

    /// Query the context and click the first visible hit.
    pub async fn click_first_visible(&self, query: &Query) -> Result<bool> {
        let hits = self.act("option query", self.context.query(query)).await?;
        match first_visible(hits).await {
            Some(el) => {
                let _ = el.scroll_into_view().await;
                self.act("option click", el.click()).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Check a radio or checkbox-like element. Native inputs are verified by
/// reading their state back; anything else counts as selected once clicked.
pub(crate) async fn try_check(target: &FillTarget, el: &Handle) -> Result<bool> {
    let tag = el.tag_name().await?.to_lowercase();
    let ty = el.attribute("type").await?.unwrap_or_default().to_lowercase();
    let _ = el.scroll_into_view().await;
    target.act("check click", el.click()).await?;
    if tag == "input" && (ty == "radio" || ty == "checkbox") {
        return el.is_checked().await;
    }
    Ok(true)
}

/// Visible elements of `hits` paired with their trimmed rendered text.
pub(crate) async fn visible_texts(hits: Vec<Handle>) -> Vec<(Handle, String)> {
    let mut out = Vec::new();
    for el in hits {
        if !matches!(el.is_visible().await, Ok(true)) {
            continue;
        }
        let text = el.inner_text().await.unwrap_or_default();
        out.push((el, text.trim().to_string()));
    }
    out
}
