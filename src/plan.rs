//! Fill plans: the ordered list of fields a caller wants filled.
//!
//! ```json
//! {
//!   "countries": [{ "country": "France", "keywords": ["france", "paris"] }],
//!   "fields": [
//!     { "key": "country_phone_code", "value": "+33" },
//!     { "key": "phone_number", "value": "+33 6 12 34 56 78",
//!       "substitute": { "when_found": "country_phone_code", "value": "6 12 34 56 78" } },
//!     { "key": "sponsorship", "value": "no", "by_country": { "US": "yes" } }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::country::CountryKeywords;
use crate::error::{Error, Result};
use crate::field::FieldValue;

/// Alternate value used when another key was resolved earlier in the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub when_found: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub value: FieldValue,
    /// Phrases identifying the field, highest priority first.
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<Substitution>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_country: BTreeMap<String, FieldValue>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            synonyms: Vec::new(),
            substitute: None,
            by_country: BTreeMap::new(),
        }
    }

    pub fn synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    pub fn substitute(mut self, when_found: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.substitute = Some(Substitution {
            when_found: when_found.into(),
            value: value.into(),
        });
        self
    }

    pub fn for_country(mut self, country: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.by_country.insert(country.into(), value.into());
        self
    }

    /// Declared synonyms, or the key itself with underscores as spaces.
    pub fn effective_synonyms(&self) -> Vec<String> {
        if self.synonyms.is_empty() {
            vec![self.key.replace('_', " ")]
        } else {
            self.synonyms.clone()
        }
    }

    /// Value to fill given what has been resolved so far. A triggered
    /// substitution wins over a per-country value, which wins over the
    /// default.
    pub fn value_for(&self, country: Option<&str>, found: &HashSet<String>) -> FieldValue {
        if let Some(sub) = &self.substitute {
            if found.contains(&sub.when_found) {
                return sub.value.clone();
            }
        }
        if let Some(value) = country.and_then(|c| self.by_country.get(c)) {
            return value.clone();
        }
        self.value.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPlan {
    #[serde(default, skip_serializing_if = "CountryKeywords::is_empty")]
    pub countries: CountryKeywords,
    pub fields: Vec<FieldSpec>,
}

impl FillPlan {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            countries: CountryKeywords::default(),
            fields,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let plan: FillPlan = serde_json::from_str(json)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Keys are non-empty and unique; substitutions refer to an earlier key.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.fields {
            if spec.key.trim().is_empty() {
                return Err(Error::Plan("field with an empty key".to_string()));
            }
            if let Some(sub) = &spec.substitute {
                if !seen.contains(sub.when_found.as_str()) {
                    return Err(Error::Plan(format!(
                        "{}: substitution depends on '{}', which is not an earlier field",
                        spec.key, sub.when_found
                    )));
                }
            }
            if !seen.insert(spec.key.as_str()) {
                return Err(Error::Plan(format!("duplicate key '{}'", spec.key)));
            }
        }
        Ok(())
    }
}
