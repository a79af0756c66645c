//! User-supplied identity filter.

use regex::Regex;

use crate::error::BirkaError;

/// A regular expression that every record path must match in full.
#[derive(Clone, Debug)]
pub struct IdentityFilter {
    pattern: String,
    regex: Regex,
}

impl IdentityFilter {
    /// Compiles `pattern`, anchored so that it must match the whole path.
    ///
    /// # Errors
    /// Returns [`BirkaError::InvalidFilterPattern`] if the pattern does not
    /// compile.
    pub fn new(pattern: impl Into<String>) -> Result<Self, BirkaError> {
        let pattern = pattern.into();
        let invalid = |source| BirkaError::InvalidFilterPattern {
            pattern: pattern.clone(),
            source,
        };
        // Compile bare first: a pattern like "a)|(b" must not sneak past the anchors.
        Regex::new(&pattern).map_err(invalid)?;
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)?;
        Ok(Self { pattern, regex })
    }

    /// The pattern as entered by the user.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True if `path` matches the pattern in full.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_required() {
        let filter = IdentityFilter::new(r"plate\d+/.*\.tif").unwrap();

        assert!(filter.matches("plate1/a1.tif"));
        assert!(!filter.matches("old/plate1/a1.tif"));
        assert!(!filter.matches("plate1/a1.tif.bak"));
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let filter = IdentityFilter::new("a|b").unwrap();

        assert!(filter.matches("a"));
        assert!(filter.matches("b"));
        assert!(!filter.matches("ab"));
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchors() {
        assert!(IdentityFilter::new("a)|(b").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = IdentityFilter::new("plate(").unwrap_err();

        match err {
            BirkaError::InvalidFilterPattern { pattern, .. } => assert_eq!(pattern, "plate("),
            other => panic!("unexpected error: {other}"),
        }
    }
}
