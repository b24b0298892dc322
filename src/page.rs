use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::Page as CrPage;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dom_script::call_expression;
use crate::driver::{Context, Document, Handle, SearchContext};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::query::Query;

/// Reply envelope of the injected script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Reply<T> {
    Ok(T),
    Detached(String),
    NotInteractable(String),
    Failed(String),
}

/// Run one script operation in the page. Operations that target a frame
/// carry its index into the flattened frame list among `args`.
pub(crate) async fn call<T: DeserializeOwned>(page: &CrPage, op: &str, args: &[Value]) -> Result<T> {
    let result = page
        .evaluate(call_expression(op, args))
        .await
        .map_err(|e| Error::JsError(e.to_string()))?;
    let json_str: String = result
        .into_value()
        .map_err(|e| Error::JsError(e.to_string()))?;
    match serde_json::from_str::<Reply<T>>(&json_str)? {
        Reply::Ok(v) => Ok(v),
        Reply::Detached(msg) => Err(Error::Detached(msg)),
        Reply::NotInteractable(msg) => Err(Error::NotInteractable(msg)),
        Reply::Failed(msg) => Err(Error::JsError(format!("{op}: {msg}"))),
    }
}

/// Wrapper around a chromiumoxide Page. Serves as the [`Document`] the
/// engine resolves fields against.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self { inner, default_timeout }
    }

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        Ok(())
    }

    /// Rendered text of the top document, used for country detection.
    pub async fn visible_text(&self) -> Result<String> {
        call(&self.inner, "visibleText", &[]).await
    }

    /// Wait until the top document has a body, polling every 100ms up to the
    /// default timeout.
    pub async fn wait_for_body(&self) -> Result<()> {
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();
        loop {
            match self.inner.evaluate("!!document.body").await {
                Ok(v) if v.clone().into_value::<bool>().unwrap_or(false) => return Ok(()),
                _ if start.elapsed() < self.default_timeout => tokio::time::sleep(interval).await,
                _ => return Err(Error::Timeout("document body".to_string())),
            }
        }
    }

    /// Evaluate a JavaScript expression and return the result as a string.
    pub async fn evaluate(&self, expression: &str) -> Result<String> {
        let result = self
            .inner
            .evaluate(expression)
            .await
            .map_err(|e| Error::JsError(e.to_string()))?;
        match result.value() {
            Some(val) => Ok(val.to_string()),
            None => Ok(String::new()),
        }
    }

    fn context(&self, frame: Option<usize>) -> Context {
        Arc::new(FrameContext {
            page: self.inner.clone(),
            frame,
        })
    }
}

#[async_trait]
impl Document for Page {
    fn main_context(&self) -> Context {
        self.context(None)
    }

    async fn frame_count(&self) -> Result<usize> {
        call(&self.inner, "frameCount", &[]).await
    }

    async fn frame(&self, index: usize) -> Result<Context> {
        let _: bool = call(&self.inner, "frameReady", &[json!(index)]).await?;
        Ok(self.context(Some(index)))
    }
}

/// The top document or one same-origin frame of a [`Page`].
pub struct FrameContext {
    page: CrPage,
    frame: Option<usize>,
}

#[async_trait]
impl SearchContext for FrameContext {
    fn describe(&self) -> String {
        match self.frame {
            None => "main".to_string(),
            Some(i) => format!("frame#{i}"),
        }
    }

    async fn query(&self, query: &Query) -> Result<Vec<Handle>> {
        let refs: Vec<u64> = call(
            &self.page,
            "query",
            &[json!(self.frame), Value::Null, serde_json::to_value(query)?],
        )
        .await?;
        Ok(refs
            .into_iter()
            .map(|id| Element::handle(self.page.clone(), self.frame, id))
            .collect())
    }
}
