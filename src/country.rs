//! Guess which country a job posting is for from its visible text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub country: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword table. Earlier entries win ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryKeywords {
    entries: Vec<CountryEntry>,
}

impl CountryKeywords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, country: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.push(CountryEntry {
            country: country.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }
}

/// Count case-insensitive occurrences of every keyword and return the
/// country with the most hits, or `None` when nothing matched.
pub fn detect_country<'a>(text: &str, table: &'a CountryKeywords) -> Option<&'a str> {
    let text = text.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for entry in &table.entries {
        let hits: usize = entry
            .keywords
            .iter()
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .map(|kw| text.matches(kw.as_str()).count())
            .sum();
        if hits == 0 {
            continue;
        }
        if best.map_or(true, |(_, most)| hits > most) {
            best = Some((entry.country.as_str(), hits));
        }
    }
    best.map(|(country, _)| country)
}
