//! Fuzzy matching of free text against rendered option labels.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use similar::TextDiff;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case-fold, strip accents and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sequence similarity in `[0, 1]` between two strings after [`normalize`]:
/// twice the characters kept in order, over the combined length.
///
/// Symmetric; identical normalized strings score exactly 1.0.
pub fn score(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a == b {
        return 1.0;
    }
    let ab = TextDiff::from_chars(a.as_str(), b.as_str()).ratio();
    let ba = TextDiff::from_chars(b.as_str(), a.as_str()).ratio();
    f64::from(ab.max(ba)).clamp(0.0, 1.0)
}

/// Alphanumeric tokens of the normalized text.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A rendered option scored against a target value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredOption {
    pub text: String,
    pub normalized_tokens: BTreeSet<String>,
    pub score: f64,
}

impl ScoredOption {
    /// Fraction of the target's distinct tokens present in `text`.
    pub fn by_tokens(target: &str, text: &str) -> Self {
        let wanted: BTreeSet<String> = tokens(target).into_iter().collect();
        let have: BTreeSet<String> = tokens(text).into_iter().collect();
        let overlap = wanted.iter().filter(|t| have.contains(*t)).count();
        let score = if wanted.is_empty() {
            0.0
        } else {
            overlap as f64 / wanted.len() as f64
        };
        Self {
            text: text.to_string(),
            normalized_tokens: have,
            score,
        }
    }

    /// Whole-string similarity against `target`.
    pub fn by_similarity(target: &str, text: &str) -> Self {
        Self {
            text: text.to_string(),
            normalized_tokens: tokens(text).into_iter().collect(),
            score: score(target, text),
        }
    }

    fn covers(&self, target: &BTreeSet<String>) -> bool {
        target.iter().all(|t| self.normalized_tokens.contains(t))
    }
}

/// Index and score of the option most similar to `target`. Ties keep the
/// earliest option.
pub fn best_match<S: AsRef<str>>(target: &str, options: &[S]) -> Option<(usize, ScoredOption)> {
    let mut best: Option<(usize, ScoredOption)> = None;
    for (idx, text) in options.iter().enumerate() {
        let scored = ScoredOption::by_similarity(target, text.as_ref());
        let better = match &best {
            None => true,
            Some((_, current)) => scored.score > current.score,
        };
        if better {
            best = Some((idx, scored));
        }
    }
    best
}

/// Rank options for a composite value such as "City, Region, Country".
///
/// Highest token overlap wins; ties go to the option with fewer tokens, then
/// to full coverage of the target's tokens, then to document order.
pub fn best_by_tokens<S: AsRef<str>>(target: &str, options: &[S]) -> Option<(usize, ScoredOption)> {
    let wanted: BTreeSet<String> = tokens(target).into_iter().collect();
    let mut scored: Vec<(usize, ScoredOption)> = options
        .iter()
        .enumerate()
        .map(|(idx, text)| (idx, ScoredOption::by_tokens(target, text.as_ref())))
        .collect();
    scored.sort_by(|(ia, a), (ib, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.normalized_tokens.len().cmp(&b.normalized_tokens.len()))
            .then(b.covers(&wanted).cmp(&a.covers(&wanted)))
            .then(ia.cmp(ib))
    });
    scored.into_iter().next().filter(|(_, s)| s.score > 0.0)
}

/// Text typed into a location-style filter: the first part plus the initial
/// of the second ("Paris, France" becomes "Paris, F").
pub fn typed_prefix(value: &str) -> String {
    let parts: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => value.trim().to_string(),
        [only] => only.to_string(),
        [first, second, ..] => match second.chars().next() {
            Some(initial) => format!("{first}, {initial}"),
            None => first.to_string(),
        },
    }
}

/// Values with several comma-separated parts are ranked by tokens.
pub fn is_composite(value: &str) -> bool {
    value.split(',').filter(|p| !p.trim().is_empty()).count() > 1
}
