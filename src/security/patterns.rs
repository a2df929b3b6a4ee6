//! Sensitive name matchers.
//!
//! Field and header names are compiled into a single case-insensitive
//! alternation of whole-word patterns: `\b(?:name1)\b|\b(?:name2)\b|...`.
//! A key is sensitive when any alternative matches anywhere inside it.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Header names masked whenever headers are present and the policy does
/// not ask for every header to be masked.
pub const DEFAULT_SENSITIVE_HEADERS: &[&str] = &["Authorization", "X-Xsrf-Token"];

lazy_static! {
    /// Matcher for the built-in header names only.
    static ref DEFAULT_HEADERS_PATTERN: SensitivePattern =
        SensitivePattern::compile(DEFAULT_SENSITIVE_HEADERS).unwrap().unwrap();
}

/// Compiled whole-word, case-insensitive name matcher.
#[derive(Debug, Clone)]
pub struct SensitivePattern {
    regex: Regex,
}

impl SensitivePattern {
    /// Compile a matcher from a list of names.
    ///
    /// Returns `Ok(None)` for an empty list: no name can be sensitive then.
    pub fn compile<S: AsRef<str>>(names: &[S]) -> Result<Option<Self>, regex::Error> {
        if names.is_empty() {
            return Ok(None);
        }

        let alternation = names
            .iter()
            .map(|name| word_pattern(name.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        let regex = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(Some(Self { regex }))
    }

    /// Matcher for [`DEFAULT_SENSITIVE_HEADERS`].
    pub fn default_headers() -> Self {
        DEFAULT_HEADERS_PATTERN.clone()
    }

    /// Check whether `name` contains a configured name as a whole word.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Check that a single name compiles on its own.
///
/// Used at option assignment so that a bad name is rejected before it can
/// reach a [`Cleaner`](crate::security::Cleaner). The bare name must parse
/// by itself, so an unbalanced `)` cannot close the `(?:...)` group it is
/// wrapped in and escape the word boundaries.
pub fn validate_name(name: &str) -> Result<(), regex::Error> {
    Regex::new(name)?;
    Regex::new(&word_pattern(name)).map(|_| ())
}

fn word_pattern(name: &str) -> String {
    format!(r"\b(?:{})\b", name)
}
