//! Widget-type classification of a located element.
//!
//! [`probe`] reads what the rules need from the live page; [`classify_traits`]
//! is a pure decision over those facts, so identical markup always lands on
//! the same [`WidgetType`].

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::driver::{Context, Handle};
use crate::query::{Query, Selector, TextMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetType {
    NotFound,
    Textbox,
    Textarea,
    Number,
    Date,
    Checkbox,
    Radio,
    Select,
    Combobox,
    CustomCombobox,
}

impl WidgetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::NotFound => "NOT_FOUND",
            WidgetType::Textbox => "TEXTBOX",
            WidgetType::Textarea => "TEXTAREA",
            WidgetType::Number => "NUMBER",
            WidgetType::Date => "DATE",
            WidgetType::Checkbox => "CHECKBOX",
            WidgetType::Radio => "RADIO",
            WidgetType::Select => "SELECT",
            WidgetType::Combobox => "COMBOBOX",
            WidgetType::CustomCombobox => "CUSTOM_COMBOBOX",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about one element that the classification rules consult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementTraits {
    pub tag: String,
    pub input_type: String,
    pub role: String,
    pub aria_haspopup: String,
    pub aria_autocomplete: String,
    /// `list` attribute resolves to an existing `<datalist>`.
    pub has_datalist: bool,
    /// `aria-controls`/`aria-owns` resolves to a populated options container.
    pub listbox_wired: bool,
    /// Hidden tracking input or dropdown-ish class names in the enclosing block.
    pub nearby_dropdown: bool,
}

const TEXT_INPUT_TYPES: &[&str] = &["", "text", "search", "email", "tel", "url"];
const DATE_INPUT_TYPES: &[&str] = &["date", "datetime-local", "month", "week", "time"];
const DROPDOWN_CLASS_HINTS: &[&str] = &["dropdown", "typeahead", "autocomplete", "results"];

impl ElementTraits {
    fn is_text_input(&self) -> bool {
        self.tag == "input" && TEXT_INPUT_TYPES.contains(&self.input_type.as_str())
    }

    fn autocomplete_signal(&self) -> bool {
        matches!(self.aria_autocomplete.as_str(), "list" | "both" | "inline")
    }
}

/// First matching rule wins.
pub fn classify_traits(t: &ElementTraits) -> WidgetType {
    if t.tag == "select" {
        return WidgetType::Combobox;
    }
    if t.tag == "input" && t.has_datalist {
        return WidgetType::Combobox;
    }
    if t.role == "combobox" || t.aria_haspopup == "listbox" {
        return WidgetType::Combobox;
    }
    if t.autocomplete_signal() {
        return if t.listbox_wired {
            WidgetType::Combobox
        } else {
            WidgetType::CustomCombobox
        };
    }

    if t.tag == "textarea" {
        return WidgetType::Textarea;
    }
    if t.tag == "input" {
        match t.input_type.as_str() {
            "checkbox" => return WidgetType::Checkbox,
            "radio" => return WidgetType::Radio,
            "number" => return WidgetType::Number,
            ty if DATE_INPUT_TYPES.contains(&ty) => return WidgetType::Date,
            _ => {}
        }
    }
    match t.role.as_str() {
        "radio" | "radiogroup" => return WidgetType::Radio,
        "checkbox" | "switch" => return WidgetType::Checkbox,
        _ => {}
    }

    if t.is_text_input() && t.nearby_dropdown {
        return WidgetType::CustomCombobox;
    }
    WidgetType::Textbox
}

/// Read the facts [`classify_traits`] needs. Probe failures count as "no
/// signal" rather than errors.
pub async fn probe(ctx: &Context, el: &Handle) -> ElementTraits {
    let attr = |name: &'static str| async move {
        el.attribute(name)
            .await
            .ok()
            .flatten()
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default()
    };

    let mut t = ElementTraits {
        tag: el.tag_name().await.map(|t| t.to_lowercase()).unwrap_or_default(),
        input_type: attr("type").await,
        role: attr("role")
            .await
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string(),
        aria_haspopup: attr("aria-haspopup").await,
        aria_autocomplete: attr("aria-autocomplete").await,
        ..Default::default()
    };

    if t.tag == "input" {
        t.has_datalist = has_datalist(ctx, el).await;
    }
    if t.autocomplete_signal() {
        t.listbox_wired = listbox_wired(ctx, el).await;
    }
    if t.is_text_input() {
        t.nearby_dropdown = nearby_dropdown(el).await;
    }
    t
}

pub async fn classify(ctx: &Context, el: &Handle) -> WidgetType {
    let traits = probe(ctx, el).await;
    let widget = classify_traits(&traits);
    debug!(element = %el.describe(), ?traits, %widget, "classified");
    widget
}

async fn has_datalist(ctx: &Context, el: &Handle) -> bool {
    let list_id = match el.attribute("list").await {
        Ok(Some(id)) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return false,
    };
    let query = Query::one(Selector::tag("datalist").attr_eq("id", &list_id));
    matches!(ctx.query(&query).await, Ok(hits) if !hits.is_empty())
}

async fn listbox_wired(ctx: &Context, el: &Handle) -> bool {
    let mut target = None;
    for name in ["aria-controls", "aria-owns"] {
        if let Ok(Some(v)) = el.attribute(name).await {
            if let Some(id) = v.split_whitespace().next() {
                target = Some(id.to_string());
                break;
            }
        }
    }
    let Some(id) = target else {
        return false;
    };
    let container = match ctx.query(&Query::by_id(&id)).await {
        Ok(hits) => match hits.into_iter().next() {
            Some(c) => c,
            None => return false,
        },
        Err(_) => return false,
    };

    let options = Query::select(vec![
        Selector::any().role_attr("option"),
        Selector::any().role_attr("listbox"),
    ]);
    let list_items = Query::select(vec![Selector::tag("ul"), Selector::tag("ol")])
        .within(Query::one(Selector::tag("li")));
    for query in [options, list_items] {
        if matches!(container.query(&query).await, Ok(hits) if !hits.is_empty()) {
            return true;
        }
    }
    false
}

async fn nearby_dropdown(el: &Handle) -> bool {
    let block = vec![
        Selector::any().class_contains("application"),
        Selector::tag("form"),
        Selector::tag("div"),
    ];
    let root = match el.closest(&block).await {
        Ok(Some(root)) => root,
        _ => return false,
    };

    let mut signals = vec![
        Selector::tag("input").attr("type", TextMatch::fold("hidden")),
        Selector::tag("input").has_attr("hidden"),
    ];
    signals.extend(DROPDOWN_CLASS_HINTS.iter().map(|hint| Selector::any().class_contains(hint)));

    for selector in signals {
        if let Ok(hits) = root.query(&Query::one(selector.clone())).await {
            if !hits.is_empty() {
                debug!(element = %el.describe(), ?selector, "dropdown markup nearby");
                return true;
            }
        }
    }
    false
}
