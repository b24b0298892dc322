use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::page::Page as CrPage;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dom_script::REF_ATTR;
use crate::driver::{ElementHandle, Handle};
use crate::error::{Error, Result};
use crate::page::call;
use crate::query::{Query, Selector};

#[derive(Debug, Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

/// Named keys: (key, code, virtual key code, text).
const NAMED_KEYS: &[(&str, &str, i64, &str)] = &[
    ("Enter", "Enter", 13, "\r"),
    ("Tab", "Tab", 9, ""),
    ("Escape", "Escape", 27, ""),
    ("Backspace", "Backspace", 8, ""),
    ("ArrowDown", "ArrowDown", 40, ""),
    ("ArrowUp", "ArrowUp", 38, ""),
];

/// One element of a Chromium page, addressed by its script-assigned ref.
/// Input goes through CDP so the page sees trusted mouse and key events.
pub struct Element {
    page: CrPage,
    frame: Option<usize>,
    id: u64,
}

impl Element {
    pub(crate) fn handle(page: CrPage, frame: Option<usize>, id: u64) -> Handle {
        Arc::new(Self { page, frame, id })
    }

    async fn op<T: serde::de::DeserializeOwned>(&self, op: &str, extra: &[Value]) -> Result<T> {
        let mut args = vec![json!(self.frame), json!(self.id)];
        args.extend_from_slice(extra);
        call(&self.page, op, &args).await
    }

    async fn mouse(&self, kind: DispatchMouseEventType, at: &Point) -> Result<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(at.x)
            .y(at.y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(Error::JsError)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn key(&self, kind: DispatchKeyEventType, key: &str, code: &str, vk: i64, text: &str) -> Result<()> {
        let mut builder = DispatchKeyEventParams::builder().r#type(kind).key(key);
        if !code.is_empty() {
            builder = builder.code(code);
        }
        if vk != 0 {
            builder = builder
                .windows_virtual_key_code(vk)
                .native_virtual_key_code(vk);
        }
        if !text.is_empty() {
            builder = builder.text(text);
        }
        let params = builder.build().map_err(Error::JsError)?;
        self.page.execute(params).await?;
        Ok(())
    }

    fn wrap(&self, id: u64) -> Handle {
        Element::handle(self.page.clone(), self.frame, id)
    }
}

#[async_trait]
impl ElementHandle for Element {
    fn describe(&self) -> String {
        match self.frame {
            None => format!("[{REF_ATTR}=\"{}\"]", self.id),
            Some(f) => format!("frame#{f} [{REF_ATTR}=\"{}\"]", self.id),
        }
    }

    async fn tag_name(&self) -> Result<String> {
        self.op("tagName", &[]).await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.op("attribute", &[json!(name)]).await
    }

    async fn is_attached(&self) -> Result<bool> {
        self.op("attached", &[]).await
    }

    async fn is_visible(&self) -> Result<bool> {
        self.op("visible", &[]).await
    }

    async fn is_checked(&self) -> Result<bool> {
        self.op("checked", &[]).await
    }

    async fn inner_text(&self) -> Result<String> {
        self.op("innerText", &[]).await
    }

    async fn input_value(&self) -> Result<String> {
        self.op("inputValue", &[]).await
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.op("scroll", &[]).await
    }

    async fn click(&self) -> Result<()> {
        let at: Point = self.op("point", &[]).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, &at).await?;
        self.mouse(DispatchMouseEventType::MousePressed, &at).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, &at).await
    }

    async fn clear(&self) -> Result<()> {
        self.op("clear", &[]).await
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.op::<()>("focus", &[]).await?;
        for c in text.chars() {
            let s = c.to_string();
            self.key(DispatchKeyEventType::KeyDown, &s, "", 0, &s).await?;
            self.key(DispatchKeyEventType::KeyUp, &s, "", 0, "").await?;
        }
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.op::<()>("focus", &[]).await?;
        let (key, code, vk, text) = NAMED_KEYS
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(key))
            .copied()
            .unwrap_or((key, "", 0, key));
        self.key(DispatchKeyEventType::KeyDown, key, code, vk, text).await?;
        self.key(DispatchKeyEventType::KeyUp, key, code, vk, "").await
    }

    async fn set_value(&self, value: &str) -> Result<()> {
        self.op("setValue", &[json!(value)]).await
    }

    async fn select_option(&self, value: &str) -> Result<()> {
        self.op("selectOption", &[json!(value)]).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Handle>> {
        let refs: Vec<u64> = call(
            &self.page,
            "query",
            &[json!(self.frame), json!(self.id), serde_json::to_value(query)?],
        )
        .await?;
        Ok(refs.into_iter().map(|id| self.wrap(id)).collect())
    }

    async fn closest(&self, selectors: &[Selector]) -> Result<Option<Handle>> {
        let found: Option<u64> = self.op("closest", &[serde_json::to_value(selectors)?]).await?;
        Ok(found.map(|id| self.wrap(id)))
    }
}
