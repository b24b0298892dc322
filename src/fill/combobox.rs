use async_trait::async_trait;
use tracing::{debug, info};

use super::{visible_texts, FillTarget, Filler, Ladder, SelectFiller};
use crate::classifier::WidgetType;
use crate::driver::Handle;
use crate::error::{Error, Result};
use crate::field::{FieldValue, FillOutcome};
use crate::query::{Query, Selector, TextMatch};
use crate::similarity::{best_by_tokens, best_match, is_composite, typed_prefix};
use crate::wait::{first_visible, settle};

/// What the grouped-panel pass ended with.
enum GroupPass {
    /// No grouped panel on the page; use the flat option tiers.
    NotGrouped,
    Picked,
    /// Every group was expanded and none held a good enough option.
    NoneGoodEnough,
}

/// ARIA comboboxes: open, type to filter, then pick an option. Native
/// `<select>` elements classified here go straight to [`SelectFiller`].
pub struct ComboboxFiller {
    target: FillTarget,
}

impl ComboboxFiller {
    pub fn new(target: FillTarget) -> Self {
        Self { target }
    }

    /// Open the popup and type the filter text. Returns whether anything was
    /// typed.
    async fn open_and_filter(&self, value: &str) -> bool {
        if let Err(e) = self.target.act("open combobox", self.target.element.click()).await {
            debug!(field = %self.target.key, error = %e, "open click failed");
        }
        let Some(editable) = self.target.editable().await else {
            debug!(field = %self.target.key, "no inner editable");
            return false;
        };
        let filter = if is_composite(value) {
            typed_prefix(value)
        } else {
            value.to_string()
        };
        let typed = async {
            self.target.act("clear filter", editable.clear()).await?;
            self.target.act("type filter", editable.type_text(&filter)).await
        };
        match typed.await {
            Ok(()) => true,
            Err(e) => {
                debug!(field = %self.target.key, error = %e, "typing filter failed");
                false
            }
        }
    }

    async fn grouped_panel(&self) -> Option<Handle> {
        let query = Query::has(
            vec![Selector::any().role_attr("listbox")],
            Query::role("group", None),
        );
        let hits = self.target.context.query(&query).await.ok()?;
        first_visible(hits).await
    }

    async fn group_at(&self, index: usize) -> Option<Handle> {
        let panel = self.grouped_panel().await?;
        let groups = panel.query(&Query::role("group", None)).await.ok()?;
        groups.into_iter().nth(index)
    }

    /// Expand group `index`, reopening the popup if the panel closed on us.
    async fn expand_group(&self, index: usize) -> Option<Handle> {
        let headers = Query::select(self.target.config.group_header_selectors.clone());
        for attempt in 0..=self.target.config.group_retries {
            if attempt > 0 {
                debug!(field = %self.target.key, group = index, attempt, "reopening panel");
                let _ = self.target.act("reopen combobox", self.target.element.click()).await;
            }
            let Some(group) = self.group_at(index).await else {
                continue;
            };
            let header = match group.query(&headers).await {
                Ok(hits) => first_visible(hits).await.unwrap_or_else(|| group.clone()),
                Err(_) => group.clone(),
            };
            let _ = header.scroll_into_view().await;
            match self.target.act("expand group", header.click()).await {
                Ok(()) => {
                    settle(self.target.config.settle_delay).await;
                    return Some(group);
                }
                Err(e) => debug!(field = %self.target.key, group = index, error = %e, "group header click failed"),
            }
        }
        None
    }

    /// Walk the groups one at a time; pick the first option anywhere that
    /// clears the threshold.
    async fn pick_from_groups(&self, value: &str) -> GroupPass {
        let Some(panel) = self.grouped_panel().await else {
            return GroupPass::NotGrouped;
        };
        let count = match panel.query(&Query::role("group", None)).await {
            Ok(groups) if !groups.is_empty() => groups.len(),
            _ => return GroupPass::NotGrouped,
        };
        debug!(field = %self.target.key, groups = count, "grouped option panel");

        let threshold = self.target.config.match_threshold;
        for index in 0..count {
            let Some(group) = self.expand_group(index).await else {
                continue;
            };
            let options = match group.query(&Query::role("option", None)).await {
                Ok(hits) => visible_texts(hits).await,
                Err(_) => continue,
            };
            let texts: Vec<&str> = options.iter().map(|(_, t)| t.as_str()).collect();
            let Some((best, scored)) = best_match(value, &texts) else {
                continue;
            };
            debug!(field = %self.target.key, group = index, option = %scored.text, score = scored.score, "best option in group");
            if scored.score < threshold {
                continue;
            }
            let option = &options[best].0;
            let _ = option.scroll_into_view().await;
            match self.target.act("option click", option.click()).await {
                Ok(()) => return GroupPass::Picked,
                Err(e) => debug!(field = %self.target.key, error = %e, "option click failed"),
            }
        }
        GroupPass::NoneGoodEnough
    }

    /// Inputs backed by a `<datalist>` accept the typed text once it names
    /// one of the listed options.
    async fn commit_datalist(&self, value: &str, typed: bool) -> Result<bool> {
        if !typed {
            return Ok(false);
        }
        let el = &self.target.element;
        let Some(list) = el.attribute("list").await?.filter(|l| !l.trim().is_empty()) else {
            return Ok(false);
        };
        let options = Query::one(Selector::tag("datalist").attr_eq("id", list.trim()))
            .within(Query::one(Selector::tag("option")));
        let hits = self.target.context.query(&options).await?;
        let mut values = Vec::with_capacity(hits.len());
        for option in hits {
            let text = option.inner_text().await.unwrap_or_default();
            let value = option.attribute("value").await?.unwrap_or(text);
            values.push(value.trim().to_string());
        }
        let threshold = self.target.config.match_threshold;
        let Some((idx, scored)) = best_match(value, &values).filter(|(_, s)| s.score >= threshold) else {
            return Ok(false);
        };
        debug!(field = %self.target.key, option = %scored.text, "committing datalist option");
        self.target.act("commit datalist", el.set_value(&values[idx])).await?;
        Ok(true)
    }

    /// Composite values ("City, Region, Country") ranked by token overlap.
    async fn pick_by_tokens(&self, value: &str) -> Result<bool> {
        if !is_composite(value) {
            return Ok(false);
        }
        let hits = self
            .target
            .act("option query", self.target.context.query(&Query::role("option", None)))
            .await?;
        let options = visible_texts(hits).await;
        let texts: Vec<&str> = options.iter().map(|(_, t)| t.as_str()).collect();
        let Some((idx, scored)) = best_by_tokens(value, &texts) else {
            return Ok(false);
        };
        debug!(field = %self.target.key, option = %scored.text, score = scored.score, "token overlap pick");
        self.target.act("option click", options[idx].0.click()).await?;
        Ok(true)
    }

    async fn pick_by_name(&self, value: &str) -> Result<bool> {
        self.target
            .click_first_visible(&Query::role("option", Some(TextMatch::exact(value))))
            .await
    }

    async fn pick_by_text(&self, value: &str) -> Result<bool> {
        let query = Query::text(vec![Selector::any().role_attr("option")], TextMatch::contains(value));
        self.target.click_first_visible(&query).await
    }
}

#[async_trait]
impl Filler for ComboboxFiller {
    fn widget(&self) -> WidgetType {
        WidgetType::Combobox
    }

    async fn fill(&self, value: &FieldValue) -> Result<FillOutcome> {
        if self.target.tag().await == "select" {
            return SelectFiller::new(self.target.clone()).fill(value).await;
        }

        let value = value.as_text();
        self.target.ready().await;
        if self.target.is_blocked().await {
            return Ok(FillOutcome::unfilled());
        }

        let typed = self.open_and_filter(&value).await;
        let listed = matches!(
            self.target.element.attribute("list").await,
            Ok(Some(list)) if !list.trim().is_empty()
        );
        if !listed {
            self.target.await_options().await;
        }

        match self.pick_from_groups(&value).await {
            GroupPass::Picked => return Ok(FillOutcome::filled()),
            GroupPass::NoneGoodEnough => {
                info!(field = %self.target.key, %value, "no grouped option cleared the threshold");
                return Ok(FillOutcome::unfilled());
            }
            GroupPass::NotGrouped => {}
        }

        let picked = Ladder::new(&self.target.key)
            .tier("datalist", self.commit_datalist(&value, typed))
            .tier("token-overlap", self.pick_by_tokens(&value))
            .tier("role-name", self.pick_by_name(&value))
            .tier("text", self.pick_by_text(&value))
            .run()
            .await;

        match picked {
            Some(_) => Ok(FillOutcome::filled()),
            None => Err(Error::NoMatchingOption { value }),
        }
    }
}
