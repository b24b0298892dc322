//! Candidate discovery: turn a synonym set into an ordered list of queries
//! and return the first visible hit.
//!
//! The order is data. [`build_strategies`] lays out every query up front;
//! [`locate`] evaluates them lazily and stops at the first visible, attached
//! element. Ties are broken by list position, never by a quality score.

use std::fmt;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::driver::{Context, Handle};
use crate::query::{form_controls, Query, Selector, TextMatch};
use crate::wait::{bounded, first_visible};

/// Priority tiers, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    RoleName,
    Label,
    LabelHop,
    Identity,
    Phone,
    Placeholder,
    NameAttr,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::RoleName => "role-name",
            Tier::Label => "label",
            Tier::LabelHop => "label-hop",
            Tier::Identity => "identity-attr",
            Tier::Phone => "phone-heuristic",
            Tier::Placeholder => "placeholder",
            Tier::NameAttr => "name-attr",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub tier: Tier,
    pub synonym: String,
    pub query: Query,
}

/// A located element, before classification.
#[derive(Clone)]
pub struct Candidate {
    pub element: Handle,
    pub tier: Tier,
    pub synonym: String,
    pub position: usize,
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("element", &self.element.describe())
            .field("tier", &self.tier)
            .field("synonym", &self.synonym)
            .field("position", &self.position)
            .finish()
    }
}

pub fn build_strategies(synonyms: &[String], config: &EngineConfig) -> Vec<Strategy> {
    let mut out = Vec::new();
    let mut push = |tier: Tier, synonym: &str, query: Query| {
        out.push(Strategy {
            tier,
            synonym: synonym.to_string(),
            query,
        })
    };

    for s in synonyms {
        push(Tier::RoleName, s, Query::role("combobox", Some(TextMatch::exact(s))));
        push(Tier::RoleName, s, Query::role("textbox", Some(TextMatch::exact(s))));
    }

    for s in synonyms {
        push(Tier::Label, s, Query::label(TextMatch::exact(s)));
    }

    for s in synonyms {
        let labels = Query::text(vec![Selector::tag("label")], TextMatch::exact(s));
        push(Tier::LabelHop, s, labels.within(Query::select(form_controls())));
    }

    for s in synonyms {
        let selectors = config
            .identity_attributes
            .iter()
            .map(|attr| Selector::any().attr_eq(attr, s))
            .collect();
        push(Tier::Identity, s, Query::select(selectors));
    }

    let phone = match Regex::new(&config.phone_pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern = %config.phone_pattern, error = %e, "invalid phone pattern, heuristic disabled");
            None
        }
    };
    if let Some(phone) = phone {
        for s in synonyms.iter().filter(|s| phone.is_match(s)) {
            push(
                Tier::Phone,
                s,
                Query::select(vec![
                    Selector::tag("input").attr("aria-label", TextMatch::fold(s)),
                    Selector::tag("textarea").attr("aria-label", TextMatch::fold(s)),
                ]),
            );
            let wrappers = Query::has(
                config.labelled_wrappers.clone(),
                Query::text(config.wrapper_labels.clone(), TextMatch::contains(s)),
            );
            push(
                Tier::Phone,
                s,
                wrappers.within(Query::select(vec![
                    Selector::tag("input").attr_not("type", TextMatch::fold("hidden")),
                    Selector::tag("textarea"),
                    Selector::any().has_attr("matinput"),
                ])),
            );
        }
    }

    for s in synonyms {
        push(
            Tier::Placeholder,
            s,
            Query::select(vec![
                Selector::tag("input").attr("placeholder", TextMatch::contains(s)),
                Selector::tag("textarea").attr("placeholder", TextMatch::contains(s)),
                Selector::tag("select").attr("placeholder", TextMatch::contains(s)),
            ]),
        );
    }

    for s in synonyms {
        push(
            Tier::NameAttr,
            s,
            Query::select(vec![
                Selector::tag("input").attr("name", TextMatch::contains(s)),
                Selector::tag("textarea").attr("name", TextMatch::contains(s)),
                Selector::tag("select").attr("name", TextMatch::contains(s)),
                Selector::any()
                    .role_attr("combobox")
                    .attr("name", TextMatch::contains(s)),
            ]),
        );
    }

    out
}

/// Evaluate strategies in order against one context.
pub async fn locate(ctx: &Context, strategies: &[Strategy], config: &EngineConfig) -> Option<Candidate> {
    for (position, strategy) in strategies.iter().enumerate() {
        let hits = match bounded(config.action_timeout, "candidate query", ctx.query(&strategy.query)).await {
            Ok(hits) => hits,
            Err(e) => {
                debug!(context = %ctx.describe(), tier = %strategy.tier, error = %e, "strategy failed");
                continue;
            }
        };
        if hits.is_empty() {
            continue;
        }
        if let Some(element) = first_visible(hits).await {
            debug!(
                context = %ctx.describe(),
                tier = %strategy.tier,
                synonym = %strategy.synonym,
                position,
                "candidate found"
            );
            return Some(Candidate {
                element,
                tier: strategy.tier,
                synonym: strategy.synonym.clone(),
                position,
            });
        }
    }
    None
}
