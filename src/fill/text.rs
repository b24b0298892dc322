use async_trait::async_trait;
use tracing::debug;

use super::{FillTarget, Filler};
use crate::classifier::WidgetType;
use crate::error::{Error, Result};
use crate::field::{FieldValue, FillOutcome};

/// Text inputs and textareas: clear, then type key by key so the page's
/// input listeners see real keystrokes.
pub struct TextFiller {
    target: FillTarget,
    widget: WidgetType,
}

impl TextFiller {
    pub fn new(target: FillTarget, widget: WidgetType) -> Self {
        Self { target, widget }
    }

    async fn type_value(&self, value: &str) -> Result<()> {
        let el = &self.target.element;
        self.target.act("focus click", el.click()).await?;
        self.target.act("clear", el.clear()).await?;
        self.target.act("type", el.type_text(value)).await?;
        Ok(())
    }
}

#[async_trait]
impl Filler for TextFiller {
    fn widget(&self) -> WidgetType {
        self.widget
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let value = value.as_text();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }
        if matches!(self.target.element.input_value().await, Ok(current) if current == value) {
            return Ok(FillOutcome::already_correct());
        }

        if let Err(e) = self.type_value(&value).await {
            debug!(field = %self.target.key, error = %e, "typing failed");
            return Err(Error::Exhausted {
                field: self.target.key.clone(),
            });
        }

        // Masked inputs may reformat what was typed; typing still happened.
        if let Ok(current) = self.target.element.input_value().await {
            if current != value {
                debug!(field = %self.target.key, %current, "value reformatted by page");
            }
        }
        Ok(FillOutcome::filled())
    }
}

/// Number and date inputs take their value directly; dates arrive already
/// formatted the way the input expects.
pub struct DirectFiller {
    target: FillTarget,
    widget: WidgetType,
}

impl DirectFiller {
    pub fn new(target: FillTarget, widget: WidgetType) -> Self {
        Self { target, widget }
    }
}

#[async_trait]
impl Filler for DirectFiller {
    fn widget(&self) -> WidgetType {
        self.widget
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let value = value.as_text();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }
        if matches!(self.target.element.input_value().await, Ok(current) if current == value) {
            return Ok(FillOutcome::already_correct());
        }
        match self
            .target
            .act("set value", self.target.element.set_value(&value))
            .await
        {
            Ok(()) => Ok(FillOutcome::filled()),
            Err(e) => {
                debug!(field = %self.target.key, error = %e, "set value failed");
                Err(Error::Exhausted {
                    field: self.target.key.clone(),
                })
            }
        }
    }
}
