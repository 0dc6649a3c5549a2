//! Regex name filter.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Invalid filter configuration.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid name filter pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Selects runs by matching their dotted full names against a regular
/// expression. Matching is a search, not an anchored match, so a plain
/// substring selects every run whose full name contains it.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    regex: Regex,
}

impl NameFilter {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, FilterError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| FilterError::BadPattern {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(NameFilter {
            pattern: pattern.to_owned(),
            regex,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn matches(&self, full_name: &str) -> bool {
        self.regex.is_match(full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_search_semantics() {
        let filter = NameFilter::new("inner", false).unwrap();
        assert!(filter.matches("root::inner::leaf"));
        assert!(filter.matches("inner"));
        assert!(!filter.matches("root::other"));
    }

    #[test]
    fn anchored_patterns_are_honored() {
        let filter = NameFilter::new("^root::leaf$", false).unwrap();
        assert!(filter.matches("root::leaf"));
        assert!(!filter.matches("root::leaf::deeper"));
    }

    #[test]
    fn case_insensitive_flag() {
        let sensitive = NameFilter::new("Leaf", false).unwrap();
        let insensitive = NameFilter::new("Leaf", true).unwrap();
        assert!(!sensitive.matches("root::leaf"));
        assert!(insensitive.matches("root::leaf"));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        assert!(matches!(
            NameFilter::new("(unclosed", false),
            Err(FilterError::BadPattern { .. })
        ));
    }
}
