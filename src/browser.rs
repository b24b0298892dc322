use std::time::Duration;

use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::{BrowserBuilder, BrowserConfig};
use crate::error::{Error, Result};
use crate::page::Page;

/// Flags that trim startup work; none of them change how forms behave.
const QUIET_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "mute-audio",
    "no-default-browser-check",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
];

/// A running Chromium that opens application pages for the form engine.
pub struct FormBrowser {
    browser: CrBrowser,
    page_timeout: Duration,
    events: tokio::task::JoinHandle<()>,
}

fn chrome_config(config: &BrowserConfig) -> Result<CrBrowserConfig> {
    let mut builder = if config.headless {
        CrBrowserConfig::builder().new_headless_mode()
    } else {
        CrBrowserConfig::builder().with_head()
    }
    .no_sandbox()
    .viewport(Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
        device_scale_factor: None,
        emulating_mobile: false,
        is_landscape: false,
        has_touch: false,
    });

    for arg in QUIET_ARGS {
        builder = builder.arg(*arg);
    }
    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }
    builder.build().map_err(Error::LaunchError)
}

impl FormBrowser {
    pub fn builder() -> BrowserBuilder {
        BrowserBuilder::new()
    }

    /// Start Chromium and drive its CDP event stream in the background.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let (browser, mut handler) = CrBrowser::launch(chrome_config(&config)?)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let events = tokio::spawn(async move { while handler.next().await.is_some() {} });
        info!(headless = config.headless, "browser launched");

        Ok(Self {
            browser,
            page_timeout: config.default_timeout,
            events,
        })
    }

    /// Open a blank tab, navigate it to `url` and wait for the document body.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let tab = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        let page = Page::new(tab, self.page_timeout);
        page.goto(url).await?;
        page.wait_for_body().await?;
        debug!(%url, "application page ready");
        Ok(page)
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "browser exit status unavailable");
        }
        self.events.abort();
        Ok(())
    }
}
