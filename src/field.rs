use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::WidgetType;
use crate::driver::{Context, Handle};

/// A resolved form control, or the not-found sentinel.
///
/// Built once per semantic key per pass and dropped after filling.
#[derive(Clone)]
pub struct Field {
    key: String,
    context: Option<Context>,
    element: Option<Handle>,
    widget: WidgetType,
}

impl Field {
    /// `widget` must not be [`WidgetType::NotFound`]; use [`Field::not_found`].
    pub fn new(key: impl Into<String>, context: Context, element: Handle, widget: WidgetType) -> Self {
        if widget == WidgetType::NotFound {
            return Self::not_found(key);
        }
        Self {
            key: key.into(),
            context: Some(context),
            element: Some(element),
            widget,
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            context: None,
            element: None,
            widget: WidgetType::NotFound,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn element(&self) -> Option<&Handle> {
        self.element.as_ref()
    }

    pub fn widget(&self) -> WidgetType {
        self.widget
    }

    pub fn is_found(&self) -> bool {
        self.element.is_some() && self.widget != WidgetType::NotFound
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("context", &self.context.as_ref().map(|c| c.describe()))
            .field("element", &self.element.as_ref().map(|e| e.describe()))
            .field("widget", &self.widget)
            .finish()
    }
}

/// Desired value for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Flag(true) => "yes".to_string(),
            FieldValue::Flag(false) => "no".to_string(),
        }
    }

    /// Truthiness for checkboxes: flags as-is; "yes"/"true"/"1"/"on"/"y"
    /// (any case) are true, everything else false.
    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => matches!(
                s.trim().to_lowercase().as_str(),
                "y" | "yes" | "true" | "1" | "on" | "checked"
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Result of one fill attempt.
///
/// `filled` or `already_correct` imply `present`; the constructors are the
/// only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillOutcome {
    present: bool,
    filled: bool,
    already_correct: bool,
}

impl FillOutcome {
    pub fn absent() -> Self {
        Self {
            present: false,
            filled: false,
            already_correct: false,
        }
    }

    /// Present but not filled: disabled, validation-blocked, or no option
    /// good enough.
    pub fn unfilled() -> Self {
        Self {
            present: true,
            filled: false,
            already_correct: false,
        }
    }

    pub fn filled() -> Self {
        Self {
            present: true,
            filled: true,
            already_correct: false,
        }
    }

    pub fn already_correct() -> Self {
        Self {
            present: true,
            filled: false,
            already_correct: true,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn is_already_correct(&self) -> bool {
        self.already_correct
    }

    /// The field holds the desired value after this attempt.
    pub fn is_satisfied(&self) -> bool {
        self.filled || self.already_correct
    }
}
