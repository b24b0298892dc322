use async_trait::async_trait;
use tracing::debug;

use super::{FillTarget, Filler, Ladder};
use crate::classifier::WidgetType;
use crate::driver::Handle;
use crate::error::{Error, Result};
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector, TextMatch};

/// One `<option>` as rendered right now.
struct NativeOption {
    handle: Handle,
    value: String,
    label: String,
}

/// Native `<select>`: by value, then by label, then open and click.
pub struct SelectFiller {
    target: FillTarget,
}

impl SelectFiller {
    pub fn new(target: FillTarget) -> Self {
        Self { target }
    }

    /// A missing `value` attribute falls back to the option text, as the
    /// browser does.
    async fn options(&self) -> Result<Vec<NativeOption>> {
        let hits = self
            .target
            .element
            .query(&Query::one(Selector::tag("option")))
            .await?;
        let mut out = Vec::with_capacity(hits.len());
        for handle in hits {
            let label = handle.inner_text().await?.trim().to_string();
            let value = handle.attribute("value").await?.unwrap_or_else(|| label.clone());
            out.push(NativeOption { handle, value, label });
        }
        Ok(out)
    }

    async fn selected_matches(&self, wanted: &str) -> bool {
        let Ok(current) = self.target.element.input_value().await else {
            return false;
        };
        if current.is_empty() {
            return false;
        }
        let fold = TextMatch::fold(wanted);
        if fold.matches(&current) {
            return true;
        }
        match self.options().await {
            Ok(options) => options
                .iter()
                .any(|o| o.value == current && fold.matches(&o.label)),
            Err(_) => false,
        }
    }

    async fn select_value(&self, value: &str) -> Result<bool> {
        self.target
            .act("select option", self.target.element.select_option(value))
            .await?;
        Ok(self.target.element.input_value().await? == value)
    }

    async fn by_exact_value(&self, wanted: &str) -> Result<bool> {
        let options = self.options().await?;
        if !options.iter().any(|o| o.value == wanted) {
            return Ok(false);
        }
        self.select_value(wanted).await
    }

    async fn by_folded_value(&self, wanted: &str) -> Result<bool> {
        let fold = TextMatch::fold(wanted);
        let options = self.options().await?;
        match options.iter().find(|o| fold.matches(&o.value)) {
            Some(o) => self.select_value(&o.value).await,
            None => Ok(false),
        }
    }

    async fn by_label(&self, wanted: &str) -> Result<bool> {
        let fold = TextMatch::fold(wanted);
        let options = self.options().await?;
        match options.iter().find(|o| fold.matches(&o.label)) {
            Some(o) => self.select_value(&o.value).await,
            None => Ok(false),
        }
    }

    async fn by_click(&self, wanted: &str) -> Result<bool> {
        let contains = TextMatch::contains(wanted);
        let options = self.options().await?;
        let Some(option) = options.into_iter().find(|o| contains.matches(&o.label)) else {
            return Ok(false);
        };
        self.target.act("open select", self.target.element.click()).await?;
        self.target.act("option click", option.handle.click()).await?;
        Ok(self.target.element.input_value().await? == option.value)
    }
}

#[async_trait]
impl Filler for SelectFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::Select
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let wanted = value.as_text();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }
        if self.selected_matches(&wanted).await {
            debug!(field = %self.target.key, "select already set");
            return Ok(FillOutcome::already_correct());
        }

        let picked = Ladder::new(&self.target.key)
            .tier("value", self.by_exact_value(&wanted))
            .tier("value-fold", self.by_folded_value(&wanted))
            .tier("label", self.by_label(&wanted))
            .tier("click", self.by_click(&wanted))
            .run()
            .await;

        match picked {
            Some(_) => Ok(FillOutcome::filled()),
            None => Err(Error::NoMatchingOption { value: wanted }),
        }
    }
}
