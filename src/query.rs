//! Structured element queries.
//!
//! A [`Query`] is plain data: drivers interpret it against a document instead
//! of receiving selector strings assembled from user text. The Chromium
//! binding ships it to the page as JSON; test doubles walk their own tree.

use serde::{Deserialize, Serialize};

/// How a piece of rendered or attribute text is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "text", rename_all = "snake_case")]
pub enum TextMatch {
    /// Whitespace-collapsed, case-sensitive equality.
    Exact(String),
    /// Whitespace-collapsed, case-insensitive equality.
    ExactFold(String),
    /// Case-insensitive substring.
    Contains(String),
}

impl TextMatch {
    pub fn exact(text: impl Into<String>) -> Self {
        TextMatch::Exact(text.into())
    }

    pub fn fold(text: impl Into<String>) -> Self {
        TextMatch::ExactFold(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        TextMatch::Contains(text.into())
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = collapse_whitespace(candidate);
        match self {
            TextMatch::Exact(text) => candidate == collapse_whitespace(text),
            TextMatch::ExactFold(text) => {
                candidate.to_lowercase() == collapse_whitespace(text).to_lowercase()
            }
            TextMatch::Contains(text) => candidate
                .to_lowercase()
                .contains(&collapse_whitespace(text).to_lowercase()),
        }
    }
}

/// Trim and collapse internal runs of whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum AttrTest {
    Present,
    Is(TextMatch),
    /// Attribute is absent or does not match.
    IsNot(TextMatch),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrFilter {
    pub name: String,
    pub test: AttrTest,
}

impl AttrFilter {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (&self.test, value) {
            (AttrTest::Present, v) => v.is_some(),
            (AttrTest::Is(m), Some(v)) => m.matches(v),
            (AttrTest::Is(_), None) => false,
            (AttrTest::IsNot(m), Some(v)) => !m.matches(v),
            (AttrTest::IsNot(_), None) => true,
        }
    }
}

/// One compound selector: an optional tag name plus attribute tests that
/// must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub tag: Option<String>,
    pub attrs: Vec<AttrFilter>,
}

impl Selector {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into().to_lowercase()),
            attrs: Vec::new(),
        }
    }

    fn with(mut self, name: &str, test: AttrTest) -> Self {
        self.attrs.push(AttrFilter {
            name: name.to_string(),
            test,
        });
        self
    }

    pub fn has_attr(self, name: &str) -> Self {
        self.with(name, AttrTest::Present)
    }

    pub fn attr(self, name: &str, matcher: TextMatch) -> Self {
        self.with(name, AttrTest::Is(matcher))
    }

    pub fn attr_eq(self, name: &str, value: &str) -> Self {
        self.attr(name, TextMatch::exact(value))
    }

    pub fn attr_not(self, name: &str, matcher: TextMatch) -> Self {
        self.with(name, AttrTest::IsNot(matcher))
    }

    pub fn class_contains(self, fragment: &str) -> Self {
        self.attr("class", TextMatch::contains(fragment))
    }

    /// `[role=…]` as an explicit attribute, not the computed role.
    pub fn role_attr(self, role: &str) -> Self {
        self.attr("role", TextMatch::fold(role))
    }

    pub fn matches<'a>(&self, tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(want) = &self.tag {
            if !want.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attrs.iter().all(|f| f.matches(attr(&f.name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Union of selectors, in document order.
    Select { selectors: Vec<Selector> },
    /// Explicit or implicit ARIA role, optionally filtered by accessible name.
    Role {
        role: String,
        name: Option<TextMatch>,
    },
    /// Controls whose associated `<label>`, `aria-label` or
    /// `aria-labelledby` text matches.
    Label { matcher: TextMatch },
    /// Elements matching a selector whose rendered text matches.
    Text {
        selectors: Vec<Selector>,
        matcher: TextMatch,
    },
    /// `inner` evaluated below every `outer` match.
    Within { outer: Box<Query>, inner: Box<Query> },
    /// Elements matching a selector that contain an `inner` match.
    Has {
        selectors: Vec<Selector>,
        inner: Box<Query>,
    },
}

impl Query {
    pub fn select(selectors: Vec<Selector>) -> Self {
        Query::Select { selectors }
    }

    pub fn one(selector: Selector) -> Self {
        Query::Select {
            selectors: vec![selector],
        }
    }

    pub fn by_id(id: &str) -> Self {
        Query::one(Selector::any().attr_eq("id", id))
    }

    pub fn role(role: &str, name: Option<TextMatch>) -> Self {
        Query::Role {
            role: role.to_string(),
            name,
        }
    }

    pub fn label(matcher: TextMatch) -> Self {
        Query::Label { matcher }
    }

    pub fn text(selectors: Vec<Selector>, matcher: TextMatch) -> Self {
        Query::Text { selectors, matcher }
    }

    pub fn within(self, inner: Query) -> Self {
        Query::Within {
            outer: Box::new(self),
            inner: Box::new(inner),
        }
    }

    pub fn has(selectors: Vec<Selector>, inner: Query) -> Self {
        Query::Has {
            selectors,
            inner: Box::new(inner),
        }
    }
}

/// Form controls a label can point at.
pub fn form_controls() -> Vec<Selector> {
    vec![
        Selector::tag("input"),
        Selector::tag("select"),
        Selector::tag("textarea"),
        Selector::any().role_attr("combobox"),
    ]
}

/// Roles whose accessible name is computed from their rendered content.
pub const NAME_FROM_CONTENT: &[&str] = &[
    "option", "radio", "checkbox", "button", "link", "menuitem", "tab", "treeitem", "heading",
];

/// Implicit ARIA role of a native element, given its tag and attribute lookup.
pub fn implicit_role<'a>(tag: &str, attr: impl Fn(&str) -> Option<&'a str>) -> Option<&'static str> {
    let tag = tag.to_ascii_lowercase();
    match tag.as_str() {
        "input" => {
            let ty = attr("type").unwrap_or("text").to_ascii_lowercase();
            match ty.as_str() {
                "radio" => Some("radio"),
                "checkbox" => Some("checkbox"),
                "number" => Some("spinbutton"),
                "button" | "submit" | "reset" | "image" => Some("button"),
                "hidden" | "file" | "date" | "datetime-local" | "month" | "time" | "week"
                | "color" | "range" | "password" => None,
                _ if attr("list").is_some() => Some("combobox"),
                _ => Some("textbox"),
            }
        }
        "textarea" => Some("textbox"),
        "select" => {
            let size = attr("size").and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0);
            if attr("multiple").is_some() || size > 1 {
                Some("listbox")
            } else {
                Some("combobox")
            }
        }
        "option" => Some("option"),
        "datalist" => Some("listbox"),
        "optgroup" | "fieldset" => Some("group"),
        "button" => Some("button"),
        "a" if attr("href").is_some() => Some("link"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some("heading"),
        _ => None,
    }
}

/// Computed role: first token of an explicit `role` attribute, else implicit.
pub fn computed_role<'a>(tag: &str, attr: impl Fn(&str) -> Option<&'a str> + Copy) -> Option<String> {
    match attr("role").and_then(|r| r.split_whitespace().next()) {
        Some(explicit) => Some(explicit.to_ascii_lowercase()),
        None => implicit_role(tag, attr).map(str::to_string),
    }
}
