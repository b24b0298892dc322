use std::time::Duration;

use crate::browser::FormBrowser;
use crate::error::Result;
use crate::query::{Selector, TextMatch};

pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Default timeout for page-level waits (default: 30s).
    pub default_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chrome_path: None,
            default_timeout: Duration::from_secs(30),
        }
    }
}

pub struct BrowserBuilder {
    config: BrowserConfig,
}

impl BrowserBuilder {
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build_config(self) -> BrowserConfig {
        self.config
    }

    pub async fn build(self) -> Result<FormBrowser> {
        FormBrowser::launch(self.build_config()).await
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tuning knobs for field resolution and filling.
///
/// The threshold and the locator priority order were tuned by hand against a
/// sample of job boards; expect to recalibrate them for other site families.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum similarity for picking an option out of a grouped panel.
    pub match_threshold: f64,
    /// Wait for a located candidate to be attached before classifying it.
    pub attach_timeout: Duration,
    /// Wait for a field to be attached and scrolled before filling.
    pub ready_timeout: Duration,
    /// Upper bound for any single driver interaction.
    pub action_timeout: Duration,
    /// Frames that do not answer within this bound are skipped.
    pub frame_timeout: Duration,
    /// Pause after a state-changing action before reading the DOM again.
    pub settle_delay: Duration,
    /// How long an opened or filtered popup gets to render its options.
    pub options_timeout: Duration,
    /// Reopen-and-retry attempts when a grouped panel closes mid-expansion.
    pub group_retries: usize,
    /// Attributes whose exact value identifies a field.
    pub identity_attributes: Vec<String>,
    /// Synonyms matching this pattern get the phone-field heuristics.
    pub phone_pattern: String,
    /// Wrappers that pair a visible label with their control.
    pub labelled_wrappers: Vec<Selector>,
    /// Label elements inside a labelled wrapper.
    pub wrapper_labels: Vec<Selector>,
    /// Clickable headers of collapsed option groups.
    pub group_header_selectors: Vec<Selector>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.7,
            attach_timeout: Duration::from_millis(800),
            ready_timeout: Duration::from_millis(1500),
            action_timeout: Duration::from_secs(2),
            frame_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            options_timeout: Duration::from_millis(1500),
            group_retries: 1,
            identity_attributes: vec![
                "id".to_string(),
                "formcontrolname".to_string(),
                "attrid".to_string(),
            ],
            phone_pattern: r"(?i)\b(phone|t[ée]l[ée]phone|mobile|cell)\b".to_string(),
            labelled_wrappers: vec![
                Selector::tag("mat-form-field"),
                Selector::any().class_contains("form-field"),
            ],
            wrapper_labels: vec![
                Selector::tag("mat-label"),
                Selector::tag("label"),
            ],
            group_header_selectors: vec![
                Selector::any().class_contains("optgroup-label"),
                Selector::any().class_contains("mdc-list-item__primary-text"),
                Selector::any().role_attr("presentation"),
                Selector::any().attr("aria-expanded", TextMatch::exact("false")),
            ],
        }
    }
}

pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn match_threshold(mut self, threshold: f64) -> Self {
        self.config.match_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn attach_timeout(mut self, timeout: Duration) -> Self {
        self.config.attach_timeout = timeout;
        self
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.config.ready_timeout = timeout;
        self
    }

    pub fn action_timeout(mut self, timeout: Duration) -> Self {
        self.config.action_timeout = timeout;
        self
    }

    pub fn frame_timeout(mut self, timeout: Duration) -> Self {
        self.config.frame_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn options_timeout(mut self, timeout: Duration) -> Self {
        self.config.options_timeout = timeout;
        self
    }

    pub fn group_retries(mut self, retries: usize) -> Self {
        self.config.group_retries = retries;
        self
    }

    pub fn identity_attribute(mut self, name: impl Into<String>) -> Self {
        self.config.identity_attributes.push(name.into());
        self
    }

    pub fn phone_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.phone_pattern = pattern.into();
        self
    }

    pub fn labelled_wrapper(mut self, wrapper: Selector) -> Self {
        self.config.labelled_wrappers.push(wrapper);
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
