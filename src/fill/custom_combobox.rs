use async_trait::async_trait;
use tracing::debug;

use super::{FillTarget, Filler, Ladder};
use crate::classifier::WidgetType;
use crate::driver::Handle;
use crate::error::Result;
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector, TextMatch};

/// Framework-styled dropdowns with no ARIA contract. Never fails: the last
/// resort closes the popup and reports the field as unfilled.
pub struct CustomComboboxFiller {
    target: FillTarget,
}

impl CustomComboboxFiller {
    pub fn new(target: FillTarget) -> Self {
        Self { target }
    }

    async fn type_filter(&self, value: &str) -> Option<Handle> {
        let editable = self.target.editable().await?;
        if let Err(e) = self.target.act("clear", editable.clear()).await {
            debug!(field = %self.target.key, error = %e, "clear failed");
        }
        if let Err(e) = self.target.act("type", editable.type_text(value)).await {
            debug!(field = %self.target.key, error = %e, "typing failed");
        }
        Some(editable)
    }

    /// Options nested in a listbox, or items of a menu.
    fn nested_options(container: &str, item: &str, value: &str) -> Query {
        Query::one(Selector::any().role_attr(container))
            .within(Query::text(vec![Selector::any().role_attr(item)], TextMatch::contains(value)))
    }
}

#[async_trait]
impl Filler for CustomComboboxFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::CustomCombobox
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let value = value.as_text();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }

        if let Err(e) = self.target.act("open", self.target.element.click()).await {
            debug!(field = %self.target.key, error = %e, "open click failed");
        }
        let editable = self.type_filter(&value).await;
        let commit_on = editable.unwrap_or_else(|| self.target.element.clone());
        self.target.await_options().await;

        let picked = Ladder::new(&self.target.key)
            .tier("role-name", async {
                let query = Query::role("option", Some(TextMatch::exact(&value)));
                self.target.click_first_visible(&query).await
            })
            .tier("text", async {
                let query = Query::text(vec![Selector::any().role_attr("option")], TextMatch::contains(&value));
                self.target.click_first_visible(&query).await
            })
            .tier("listbox", async {
                let query = Self::nested_options("listbox", "option", &value);
                self.target.click_first_visible(&query).await
            })
            .tier("menu", async {
                let query = Self::nested_options("menu", "menuitem", &value);
                self.target.click_first_visible(&query).await
            })
            .tier("enter", async {
                self.target.act("commit", commit_on.press_key("Enter")).await?;
                Ok(true)
            })
            .run()
            .await;

        if picked.is_some() {
            return Ok(FillOutcome::filled());
        }
        if let Err(e) = self.target.act("close", self.target.element.click()).await {
            debug!(field = %self.target.key, error = %e, "close click failed");
        }
        Ok(FillOutcome::unfilled())
    }
}
