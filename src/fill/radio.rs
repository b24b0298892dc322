use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use super::{try_check, FillTarget, Filler, Ladder};
use crate::classifier::WidgetType;
use crate::driver::{Handle, Scope};
use crate::error::{Error, Result};
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector, TextMatch};
use crate::wait::first_visible;

/// Map yes/no spellings onto "yes" or "no"; anything else is kept as
/// lowercase literal text. An empty value means "yes".
pub fn normalize_choice(value: &str) -> String {
    let s = value.trim().to_lowercase();
    match s.as_str() {
        "y" | "yes" | "true" | "1" | "on" => "yes".to_string(),
        "n" | "no" | "false" | "0" | "off" => "no".to_string(),
        "" => "yes".to_string(),
        _ => s,
    }
}

/// Casings a native radio's `value` attribute commonly uses.
fn value_casings(choice: &str) -> Vec<String> {
    let mut title = String::new();
    let mut at_word_start = true;
    for c in choice.chars() {
        if at_word_start {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    let mut capitalized = String::new();
    let mut chars = choice.chars();
    if let Some(first) = chars.next() {
        capitalized.extend(first.to_uppercase());
        capitalized.push_str(chars.as_str());
    }

    let mut seen = BTreeSet::new();
    [choice.to_string(), capitalized, choice.to_uppercase(), title]
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn radio_inputs() -> Selector {
    Selector::tag("input").attr("type", TextMatch::fold("radio"))
}

/// Radio groups, native or ARIA. A wrong pick is worse than none, so running
/// out of tiers is an error naming the requested value.
pub struct RadioFiller {
    target: FillTarget,
}

impl RadioFiller {
    pub fn new(target: FillTarget) -> Self {
        Self { target }
    }

    /// Search below the located element. A bare radio input widens to its
    /// enclosing group, or the whole context when it has none.
    async fn scope(&self) -> Scope {
        let el = &self.target.element;
        if self.target.tag().await != "input" {
            return Scope::Element(el.clone());
        }
        let groups = [
            Selector::any().role_attr("radiogroup"),
            Selector::tag("fieldset"),
            Selector::any().role_attr("group"),
            Selector::tag("form"),
        ];
        match el.closest(&groups).await {
            Ok(Some(group)) => Scope::Element(group),
            _ => Scope::Context(self.target.context.clone()),
        }
    }

    async fn check_first(&self, scope: &Scope, query: Query) -> Result<bool> {
        let hits = self.target.act("radio query", scope.query(&query)).await?;
        match first_visible(hits).await {
            Some(el) => try_check(&self.target, &el).await,
            None => Ok(false),
        }
    }

    async fn by_role(&self, scope: &Scope, choice: &str) -> Result<bool> {
        self.check_first(scope, Query::role("radio", Some(TextMatch::fold(choice))))
            .await
    }

    async fn by_role_text(&self, scope: &Scope, choice: &str) -> Result<bool> {
        let query = Query::text(vec![Selector::any().role_attr("radio")], TextMatch::fold(choice));
        self.check_first(scope, query).await
    }

    async fn by_value(&self, scope: &Scope, choice: &str) -> Result<bool> {
        for v in value_casings(choice) {
            if self
                .check_first(scope, Query::one(radio_inputs().attr_eq("value", &v)))
                .await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Styled radio buttons whose visible text lives on a wrapper element.
    /// The real input is usually hidden; the button's own label stands in
    /// for it, and the input's state decides success.
    async fn by_button_text(&self, scope: &Scope, choice: &str) -> Result<bool> {
        let buttons = Query::text(
            vec![
                Selector::tag("mat-radio-button"),
                Selector::any().class_contains("radio-button"),
            ],
            TextMatch::fold(choice),
        );
        let hits = self.target.act("radio button query", scope.query(&buttons)).await?;
        let Some(button) = first_visible(hits).await else {
            return Ok(false);
        };
        let input = button.query(&Query::one(radio_inputs())).await?.into_iter().next();
        if let Some(input) = &input {
            if matches!(input.is_visible().await, Ok(true)) && try_check(&self.target, input).await? {
                return Ok(true);
            }
        }

        let labels = button.query(&Query::one(Selector::tag("label"))).await?;
        let clickable = first_visible(labels).await.unwrap_or_else(|| button.clone());
        let _ = clickable.scroll_into_view().await;
        self.target.act("radio button click", clickable.click()).await?;
        match input {
            Some(input) => input.is_checked().await,
            None => Ok(true),
        }
    }

    /// Click the label; if that fails, go to its `for` target.
    async fn by_label(&self, scope: &Scope, choice: &str) -> Result<bool> {
        let labels = Query::text(vec![Selector::tag("label")], TextMatch::fold(choice));
        let hits = self.target.act("label query", scope.query(&labels)).await?;
        let Some(label) = first_visible(hits).await else {
            return Ok(false);
        };
        let linked = self.label_target(&label).await;

        match self.target.act("label click", label.click()).await {
            Ok(()) => match &linked {
                Some(input) if !input.is_checked().await.unwrap_or(false) => {
                    debug!(field = %self.target.key, "label click did not check its input");
                }
                _ => return Ok(true),
            },
            Err(e) => debug!(field = %self.target.key, error = %e, "label click failed"),
        }

        match linked {
            Some(input) => try_check(&self.target, &input).await,
            None => Ok(false),
        }
    }

    async fn label_target(&self, label: &Handle) -> Option<Handle> {
        let id = label.attribute("for").await.ok().flatten()?;
        let hits = self.target.context.query(&Query::by_id(id.trim())).await.ok()?;
        hits.into_iter().next()
    }

    /// Every native radio, matched on the text of its nearest wrapper.
    async fn by_wrapper_text(&self, scope: &Scope, choice: &str) -> Result<bool> {
        let radios = self.target.act("radio scan", scope.query(&Query::one(radio_inputs()))).await?;
        let wrappers = [
            Selector::tag("mat-radio-button"),
            Selector::any().role_attr("radio"),
            Selector::tag("label"),
            Selector::tag("li"),
            Selector::tag("span"),
            Selector::tag("div"),
        ];
        let wanted = TextMatch::fold(choice);
        for radio in radios {
            let Ok(Some(wrapper)) = radio.closest(&wrappers).await else {
                continue;
            };
            let text = wrapper.inner_text().await.unwrap_or_default();
            if !wanted.matches(&text) {
                continue;
            }
            match try_check(&self.target, &radio).await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => debug!(field = %self.target.key, error = %e, "radio click failed, trying wrapper"),
            }
            if try_check(&self.target, &wrapper).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl Filler for RadioFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::Radio
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        let choice = normalize_choice(&value.as_text());
        self.target.ready().await;
        let scope = self.scope().await;
        debug!(field = %self.target.key, %choice, ?scope, "filling radio group");

        let picked = Ladder::new(&self.target.key)
            .tier("role", self.by_role(&scope, &choice))
            .tier("role-text", self.by_role_text(&scope, &choice))
            .tier("value", self.by_value(&scope, &choice))
            .tier("button-text", self.by_button_text(&scope, &choice))
            .tier("label", self.by_label(&scope, &choice))
            .tier("wrapper-text", self.by_wrapper_text(&scope, &choice))
            .run()
            .await;

        match picked {
            Some(_) => Ok(FillOutcome::filled()),
            None => Err(Error::NoMatchingOption {
                value: value.as_text(),
            }),
        }
    }
}
