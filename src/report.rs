//! End-of-pass summary of found, filled and unfilled keys.

use std::fmt;

use serde::Serialize;

use crate::classifier::WidgetType;
use crate::field::FillOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub key: String,
    pub widget: WidgetType,
    pub outcome: FillOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldReport {
    pub fn is_found(&self) -> bool {
        self.outcome.is_present()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub fields: Vec<FieldReport>,
}

impl FillReport {
    pub fn push(&mut self, report: FieldReport) {
        self.fields.push(report);
    }

    pub fn get(&self, key: &str) -> Option<&FieldReport> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn found(&self) -> Vec<&str> {
        self.keys(|f| f.is_found())
    }

    /// Keys holding the desired value: freshly filled or already correct.
    pub fn filled(&self) -> Vec<&str> {
        self.keys(|f| f.outcome.is_satisfied())
    }

    /// Present but not set.
    pub fn unfilled(&self) -> Vec<&str> {
        self.keys(|f| f.is_found() && !f.outcome.is_satisfied())
    }

    pub fn missing(&self) -> Vec<&str> {
        self.keys(|f| !f.is_found())
    }

    fn keys(&self, pick: impl Fn(&FieldReport) -> bool) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| pick(f))
            .map(|f| f.key.as_str())
            .collect()
    }
}

impl fmt::Display for FillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            let status = if field.outcome.is_already_correct() {
                "already set"
            } else if field.outcome.is_filled() {
                "filled"
            } else if field.outcome.is_present() {
                "unfilled"
            } else {
                "not found"
            };
            write!(f, "{:<28} {:<16} {}", field.key, field.widget.as_str(), status)?;
            if let Some(err) = &field.error {
                write!(f, " ({err})")?;
            }
            writeln!(f)?;
        }
        write!(
            f,
            "found {}/{}, filled {}, unfilled {}",
            self.found().len(),
            self.fields.len(),
            self.filled().len(),
            self.unfilled().len()
        )
    }
}
