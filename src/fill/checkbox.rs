use async_trait::async_trait;

use super::{FillTarget, Filler, Ladder};
use crate::classifier::WidgetType;
use crate::error::{Error, Result};
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector};

/// Toggle only when the current state differs from the wanted one.
pub struct CheckboxFiller {
    target: FillTarget,
}

impl CheckboxFiller {
    pub fn new(target: FillTarget) -> Self {
        Self { target }
    }

    async fn checked(&self) -> bool {
        self.target.element.is_checked().await.unwrap_or(false)
    }

    async fn click_control(&self, desired: bool) -> Result<bool> {
        self.target.act("checkbox click", self.target.element.click()).await?;
        Ok(self.checked().await == desired)
    }

    /// Styled checkboxes often hide the input and expect a click on the label.
    async fn click_label(&self, desired: bool) -> Result<bool> {
        let el = &self.target.element;
        let mut label = el.closest(&[Selector::tag("label")]).await?;
        if label.is_none() {
            if let Some(id) = el.attribute("id").await? {
                let query = Query::one(Selector::tag("label").attr_eq("for", &id));
                label = self.target.context.query(&query).await?.into_iter().next();
            }
        }
        let Some(label) = label else {
            return Ok(false);
        };
        self.target.act("label click", label.click()).await?;
        Ok(self.checked().await == desired)
    }
}

#[async_trait]
impl Filler for CheckboxFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::Checkbox
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let desired = value.as_flag();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }
        if self.checked().await == desired {
            return Ok(FillOutcome::already_correct());
        }

        let done = Ladder::new(&self.target.key)
            .tier("click", self.click_control(desired))
            .tier("label", async {
                // The first click may have landed after all.
                if self.checked().await == desired {
                    return Ok(true);
                }
                self.click_label(desired).await
            })
            .run()
            .await;

        match done {
            Some(_) => Ok(FillOutcome::filled()),
            None => Err(Error::Exhausted {
                field: self.target.key.clone(),
            }),
        }
    }
}
