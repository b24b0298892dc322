//! In-memory DOM for driving the engine without a browser.
//!
//! Queries are interpreted the same way the injected page script does.
//! Clicks follow browser activation rules closely enough for the fillers:
//! labels activate their control, radios in a named group are exclusive,
//! checkboxes toggle, options inside a `<select>` select themselves, and
//! hidden or detached nodes refuse interaction.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use agentic_forms::driver::{Context, Document, ElementHandle, Handle, SearchContext};
use agentic_forms::query::{collapse_whitespace, computed_role, Query, Selector, NAME_FROM_CONTENT};
use agentic_forms::{EngineBuilder, EngineConfig, Error, Result};

pub const ROOT: usize = 0;

/// Engine settings for tests: no settle pauses, short waits.
pub fn fast_config() -> EngineConfig {
    EngineBuilder::new()
        .settle_delay(Duration::ZERO)
        .attach_timeout(Duration::from_millis(200))
        .ready_timeout(Duration::from_millis(200))
        .action_timeout(Duration::from_millis(500))
        .frame_timeout(Duration::from_millis(100))
        .options_timeout(Duration::from_millis(300))
        .build()
}

/// Declarative description of one element to insert.
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    hidden: bool,
    value: String,
    checked: bool,
}

pub fn el(tag: &str) -> El {
    El {
        tag: tag.to_lowercase(),
        ..Default::default()
    }
}

impl El {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// `display: none` until revealed.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    displayed: bool,
    attached: bool,
    value: String,
    checked: bool,
    parent: Option<usize>,
    children: Vec<usize>,
    reveals: Vec<usize>,
    hides: Vec<usize>,
    failing_clicks: usize,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn input_type(&self) -> String {
        self.attr("type").unwrap_or("text").to_lowercase()
    }
}

#[derive(Debug)]
pub struct Dom {
    nodes: Vec<Node>,
    events: Vec<String>,
    /// Nodes shown once the given number of further context queries ran.
    deferred: Vec<(usize, usize)>,
}

enum Root {
    Document,
    Below(usize),
}

impl Dom {
    fn new() -> Self {
        let body = Node {
            tag: "body".to_string(),
            attrs: Vec::new(),
            text: String::new(),
            displayed: true,
            attached: true,
            value: String::new(),
            checked: false,
            parent: None,
            children: Vec::new(),
            reveals: Vec::new(),
            hides: Vec::new(),
            failing_clicks: 0,
        };
        Self {
            nodes: vec![body],
            events: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn tick(&mut self) {
        for (id, left) in &mut self.deferred {
            *left = left.saturating_sub(1);
            if *left == 0 {
                self.nodes[*id].displayed = true;
            }
        }
        self.deferred.retain(|(_, left)| *left > 0);
    }

    fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    fn describe(&self, id: usize) -> String {
        let n = self.node(id);
        if let Some(attr_id) = n.attr("id") {
            return format!("{}#{}", n.tag, attr_id);
        }
        let text = collapse_whitespace(&n.text);
        if !text.is_empty() {
            return format!("{}({})", n.tag, text);
        }
        format!("{}@{}", n.tag, id)
    }

    fn preorder(&self, from: usize, out: &mut Vec<usize>) {
        if !self.nodes[from].attached {
            return;
        }
        out.push(from);
        for &c in &self.nodes[from].children {
            self.preorder(c, out);
        }
    }

    fn document_order(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.preorder(ROOT, &mut out);
        out
    }

    fn candidates(&self, root: &Root) -> Vec<usize> {
        match root {
            Root::Document => self.document_order(),
            Root::Below(id) => {
                let mut out = Vec::new();
                self.preorder(*id, &mut out);
                if !out.is_empty() {
                    out.remove(0);
                }
                out
            }
        }
    }

    fn ancestors(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    fn is_attached(&self, id: usize) -> bool {
        self.nodes[id].attached && self.ancestors(id).iter().all(|&a| self.nodes[a].attached)
    }

    fn is_visible(&self, id: usize) -> bool {
        self.is_attached(id)
            && self.nodes[id].displayed
            && self.ancestors(id).iter().all(|&a| self.nodes[a].displayed)
    }

    fn rendered(&self, id: usize) -> String {
        let mut parts = vec![self.nodes[id].text.clone()];
        for &c in &self.nodes[id].children {
            if self.nodes[c].attached && self.nodes[c].displayed {
                parts.push(self.rendered(c));
            }
        }
        collapse_whitespace(&parts.join(" "))
    }

    fn find_by_id(&self, attr_id: &str) -> Option<usize> {
        self.document_order()
            .into_iter()
            .find(|&i| self.nodes[i].attr("id") == Some(attr_id))
    }

    fn label_texts(&self, id: usize) -> Vec<String> {
        let n = self.node(id);
        let mut out = Vec::new();
        if let Some(by) = n.attr("aria-labelledby") {
            let text: Vec<String> = by
                .split_whitespace()
                .filter_map(|ref_id| self.find_by_id(ref_id))
                .map(|i| self.rendered(i))
                .collect();
            if !text.is_empty() {
                out.push(text.join(" "));
            }
        }
        if let Some(aria) = n.attr("aria-label") {
            if !aria.trim().is_empty() {
                out.push(aria.to_string());
            }
        }
        if let Some(own_id) = n.attr("id") {
            for i in self.document_order() {
                let l = self.node(i);
                if l.tag == "label" && l.attr("for") == Some(own_id) {
                    out.push(self.rendered(i));
                }
            }
        }
        if let Some(&wrapping) = self
            .ancestors(id)
            .iter()
            .find(|&&a| self.nodes[a].tag == "label")
        {
            if self.nodes[wrapping].attr("for").is_none() {
                out.push(self.rendered(wrapping));
            }
        }
        out
    }

    fn role(&self, id: usize) -> Option<String> {
        let n = self.node(id);
        computed_role(&n.tag, |name| n.attr(name))
    }

    fn accessible_name(&self, id: usize) -> String {
        if let Some(first) = self.label_texts(id).into_iter().next() {
            return first;
        }
        if let Some(role) = self.role(id) {
            if NAME_FROM_CONTENT.contains(&role.as_str()) {
                let text = self.rendered(id);
                if !text.is_empty() {
                    return text;
                }
            }
        }
        let n = self.node(id);
        n.attr("title")
            .or_else(|| n.attr("placeholder"))
            .unwrap_or("")
            .to_string()
    }

    fn selector_matches(&self, selectors: &[Selector], id: usize) -> bool {
        let n = self.node(id);
        selectors.iter().any(|s| s.matches(&n.tag, |name| n.attr(name)))
    }

    fn run(&self, query: &Query, root: &Root) -> Vec<usize> {
        match query {
            Query::Select { selectors } => self
                .candidates(root)
                .into_iter()
                .filter(|&i| self.selector_matches(selectors, i))
                .collect(),
            Query::Role { role, name } => self
                .candidates(root)
                .into_iter()
                .filter(|&i| self.role(i).as_deref() == Some(role.to_lowercase().as_str()))
                .filter(|&i| name.as_ref().map_or(true, |m| m.matches(&self.accessible_name(i))))
                .collect(),
            Query::Label { matcher } => self
                .candidates(root)
                .into_iter()
                .filter(|&i| self.label_texts(i).iter().any(|t| matcher.matches(t)))
                .collect(),
            Query::Text { selectors, matcher } => self
                .candidates(root)
                .into_iter()
                .filter(|&i| self.selector_matches(selectors, i) && matcher.matches(&self.rendered(i)))
                .collect(),
            Query::Within { outer, inner } => {
                let mut hits = HashSet::new();
                for o in self.run(outer, root) {
                    hits.extend(self.run(inner, &Root::Below(o)));
                }
                self.document_order()
                    .into_iter()
                    .filter(|i| hits.contains(i))
                    .collect()
            }
            Query::Has { selectors, inner } => self
                .candidates(root)
                .into_iter()
                .filter(|&i| self.selector_matches(selectors, i) && !self.run(inner, &Root::Below(i)).is_empty())
                .collect(),
        }
    }

    fn closest(&self, id: usize, selectors: &[Selector]) -> Option<usize> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&i| self.selector_matches(selectors, i))
    }

    fn check_interactable(&self, id: usize) -> Result<()> {
        if !self.is_attached(id) {
            return Err(Error::Detached(self.describe(id)));
        }
        if !self.is_visible(id) {
            return Err(Error::NotInteractable(format!("{} is hidden", self.describe(id))));
        }
        Ok(())
    }

    fn label_control(&self, label: usize) -> Option<usize> {
        if let Some(target) = self.node(label).attr("for") {
            return self.find_by_id(target);
        }
        let mut below = Vec::new();
        self.preorder(label, &mut below);
        below
            .into_iter()
            .skip(1)
            .find(|&i| matches!(self.nodes[i].tag.as_str(), "input" | "select" | "textarea"))
    }

    fn activate(&mut self, control: usize) {
        let n = &self.nodes[control];
        if n.tag != "input" {
            return;
        }
        match n.input_type().as_str() {
            "radio" => {
                if let Some(name) = n.attr("name").map(str::to_string) {
                    for i in self.document_order() {
                        let other = &self.nodes[i];
                        if other.tag == "input" && other.input_type() == "radio" && other.attr("name") == Some(name.as_str()) {
                            self.nodes[i].checked = false;
                        }
                    }
                }
                self.nodes[control].checked = true;
            }
            "checkbox" => self.nodes[control].checked = !self.nodes[control].checked,
            _ => {}
        }
    }

    fn click(&mut self, id: usize) -> Result<()> {
        self.check_interactable(id)?;
        if self.nodes[id].failing_clicks > 0 {
            self.nodes[id].failing_clicks -= 1;
            return Err(Error::NotInteractable(format!("click on {} intercepted", self.describe(id))));
        }
        self.events.push(format!("click {}", self.describe(id)));

        for target in self.nodes[id].reveals.clone() {
            self.nodes[target].displayed = true;
        }
        for target in self.nodes[id].hides.clone() {
            self.nodes[target].displayed = false;
        }

        let tag = self.nodes[id].tag.clone();
        let control = if tag == "label" {
            self.label_control(id)
        } else if tag == "input" {
            Some(id)
        } else {
            self.ancestors(id)
                .into_iter()
                .find(|&a| self.nodes[a].tag == "label")
                .and_then(|l| self.label_control(l))
        };
        if let Some(c) = control {
            self.activate(c);
        }

        if tag == "option" {
            if let Some(select) = self.ancestors(id).into_iter().find(|&a| self.nodes[a].tag == "select") {
                let value = self.option_value(id);
                self.nodes[select].value = value;
            }
        }
        match self.nodes[id].attr("role").map(str::to_lowercase).as_deref() {
            Some("radio") => self.nodes[id].set_attr("aria-checked", "true"),
            Some("checkbox") | Some("switch") => {
                let on = self.nodes[id].attr("aria-checked") == Some("true");
                self.nodes[id].set_attr("aria-checked", if on { "false" } else { "true" });
            }
            Some("option") => self.nodes[id].set_attr("aria-selected", "true"),
            _ => {}
        }
        Ok(())
    }

    fn option_value(&self, option: usize) -> String {
        self.node(option)
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| self.rendered(option))
    }

    fn is_checked(&self, id: usize) -> bool {
        let n = self.node(id);
        if n.tag == "input" {
            return n.checked;
        }
        n.attr("aria-checked") == Some("true")
    }
}

/// Shared handle to one document.
#[derive(Clone)]
pub struct MockDom(Arc<Mutex<Dom>>);

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Dom::new())))
    }

    fn lock(&self) -> MutexGuard<'_, Dom> {
        self.0.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn add(&self, parent: usize, spec: El) -> usize {
        let mut dom = self.lock();
        let id = dom.nodes.len();
        dom.nodes.push(Node {
            tag: spec.tag,
            attrs: spec.attrs,
            text: spec.text,
            displayed: !spec.hidden,
            attached: true,
            value: spec.value,
            checked: spec.checked,
            parent: Some(parent),
            children: Vec::new(),
            reveals: Vec::new(),
            hides: Vec::new(),
            failing_clicks: 0,
        });
        dom.nodes[parent].children.push(id);
        id
    }

    /// Clicking `trigger` makes `target` displayed.
    pub fn reveal_on_click(&self, trigger: usize, target: usize) {
        self.lock().nodes[trigger].reveals.push(target);
    }

    /// `id` renders on the `n`-th context query from now, like suggestions
    /// behind a debounce.
    pub fn render_after_queries(&self, id: usize, n: usize) {
        let mut dom = self.lock();
        dom.nodes[id].displayed = false;
        dom.deferred.push((id, n));
    }

    pub fn hide_on_click(&self, trigger: usize, target: usize) {
        self.lock().nodes[trigger].hides.push(target);
    }

    /// The next `n` clicks on `id` are intercepted.
    pub fn fail_clicks(&self, id: usize, n: usize) {
        self.lock().nodes[id].failing_clicks = n;
    }

    pub fn detach(&self, id: usize) {
        self.lock().nodes[id].attached = false;
    }

    pub fn value(&self, id: usize) -> String {
        self.lock().nodes[id].value.clone()
    }

    pub fn is_checked(&self, id: usize) -> bool {
        self.lock().is_checked(id)
    }

    pub fn attr(&self, id: usize, name: &str) -> Option<String> {
        self.lock().nodes[id].attr(name).map(str::to_string)
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Descriptions of clicked nodes, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("click ").map(str::to_string))
            .collect()
    }

    pub fn count_events(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn context(&self, name: &str) -> Context {
        Arc::new(MockContext {
            dom: self.clone(),
            name: name.to_string(),
        })
    }

    pub fn handle(&self, id: usize) -> Handle {
        Arc::new(MockElement { dom: self.clone(), id })
    }

    /// Single-document page with no frames.
    pub fn page(&self) -> MockPage {
        MockPage::new(self.clone())
    }
}

pub struct MockContext {
    dom: MockDom,
    name: String,
}

#[async_trait]
impl SearchContext for MockContext {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn query(&self, query: &Query) -> Result<Vec<Handle>> {
        let ids = {
            let mut dom = self.dom.lock();
            dom.tick();
            dom.run(query, &Root::Document)
        };
        Ok(ids.into_iter().map(|id| self.dom.handle(id)).collect())
    }
}

pub struct MockElement {
    dom: MockDom,
    id: usize,
}

impl MockElement {
    fn attached(&self, dom: &Dom) -> Result<()> {
        if dom.is_attached(self.id) {
            Ok(())
        } else {
            Err(Error::Detached(dom.describe(self.id)))
        }
    }
}

#[async_trait]
impl ElementHandle for MockElement {
    fn describe(&self) -> String {
        self.dom.lock().describe(self.id)
    }

    async fn tag_name(&self) -> Result<String> {
        let dom = self.dom.lock();
        self.attached(&dom)?;
        Ok(dom.nodes[self.id].tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let dom = self.dom.lock();
        self.attached(&dom)?;
        Ok(dom.nodes[self.id].attr(name).map(str::to_string))
    }

    async fn is_attached(&self) -> Result<bool> {
        Ok(self.dom.lock().is_attached(self.id))
    }

    async fn is_visible(&self) -> Result<bool> {
        Ok(self.dom.lock().is_visible(self.id))
    }

    async fn is_checked(&self) -> Result<bool> {
        let dom = self.dom.lock();
        self.attached(&dom)?;
        Ok(dom.is_checked(self.id))
    }

    async fn inner_text(&self) -> Result<String> {
        let dom = self.dom.lock();
        self.attached(&dom)?;
        Ok(dom.rendered(self.id))
    }

    async fn input_value(&self) -> Result<String> {
        let dom = self.dom.lock();
        self.attached(&dom)?;
        Ok(dom.nodes[self.id].value.clone())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        let dom = self.dom.lock();
        self.attached(&dom)
    }

    async fn click(&self) -> Result<()> {
        self.dom.lock().click(self.id)
    }

    async fn clear(&self) -> Result<()> {
        let mut dom = self.dom.lock();
        dom.check_interactable(self.id)?;
        let desc = dom.describe(self.id);
        dom.events.push(format!("clear {desc}"));
        dom.nodes[self.id].value.clear();
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let mut dom = self.dom.lock();
        dom.check_interactable(self.id)?;
        let desc = dom.describe(self.id);
        dom.events.push(format!("type {desc} {text}"));
        dom.nodes[self.id].value.push_str(text);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let mut dom = self.dom.lock();
        dom.check_interactable(self.id)?;
        let desc = dom.describe(self.id);
        dom.events.push(format!("key {desc} {key}"));
        Ok(())
    }

    async fn set_value(&self, value: &str) -> Result<()> {
        let mut dom = self.dom.lock();
        self.attached(&dom)?;
        let desc = dom.describe(self.id);
        dom.events.push(format!("set {desc} {value}"));
        dom.nodes[self.id].value = value.to_string();
        Ok(())
    }

    async fn select_option(&self, value: &str) -> Result<()> {
        let mut dom = self.dom.lock();
        self.attached(&dom)?;
        if dom.nodes[self.id].tag != "select" {
            return Err(Error::JsError("not a select".to_string()));
        }
        let options = dom.run(&Query::one(Selector::tag("option")), &Root::Below(self.id));
        if !options.iter().any(|&o| dom.option_value(o) == value) {
            return Err(Error::JsError(format!("no option with value {value}")));
        }
        let desc = dom.describe(self.id);
        dom.events.push(format!("select {desc} {value}"));
        dom.nodes[self.id].value = value.to_string();
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Handle>> {
        let ids = {
            let dom = self.dom.lock();
            self.attached(&dom)?;
            dom.run(query, &Root::Below(self.id))
        };
        Ok(ids.into_iter().map(|id| self.dom.handle(id)).collect())
    }

    async fn closest(&self, selectors: &[Selector]) -> Result<Option<Handle>> {
        let found = {
            let dom = self.dom.lock();
            self.attached(&dom)?;
            dom.closest(self.id, selectors)
        };
        Ok(found.map(|id| self.dom.handle(id)))
    }
}

pub enum FrameSlot {
    Ready(MockDom),
    /// Never answers.
    Hanging,
    /// Cross-origin: access is refused.
    Refused,
}

pub struct MockPage {
    main: MockDom,
    frames: Vec<FrameSlot>,
}

impl MockPage {
    pub fn new(main: MockDom) -> Self {
        Self {
            main,
            frames: Vec::new(),
        }
    }

    pub fn frame(mut self, slot: FrameSlot) -> Self {
        self.frames.push(slot);
        self
    }
}

#[async_trait]
impl Document for MockPage {
    fn main_context(&self) -> Context {
        self.main.context("main")
    }

    async fn frame_count(&self) -> Result<usize> {
        Ok(self.frames.len())
    }

    async fn frame(&self, index: usize) -> Result<Context> {
        match self.frames.get(index) {
            Some(FrameSlot::Ready(dom)) => Ok(dom.context(&format!("frame#{index}"))),
            Some(FrameSlot::Hanging) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::Timeout(format!("frame#{index}")))
            }
            Some(FrameSlot::Refused) => Err(Error::JsError(format!("frame#{index} is cross-origin"))),
            None => Err(Error::Detached(format!("frame#{index}"))),
        }
    }
}
