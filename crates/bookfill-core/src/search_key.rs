//! Search key classification for metadata lookups.
//!
//! A lookup key is either a numeric identifier (ISBN or catalogue item id),
//! which upstream services match exactly, or free text (a title), which they
//! rank by accuracy. The distinction is made once, here, when the key enters
//! the pipeline.
//!
//! # Cleaning numeric keys
//!
//! Keys read back from spreadsheets carry some noise:
//!
//! - Float artifacts: `9788937460449.0` (an ISBN column once parsed as numbers)
//! - Separators: `978-89-374-6044-9`, `978 89 374 6044 9`
//! - Paired ISBNs: `8937460440 9788937460449` (ISBN-10 and ISBN-13 in one cell)

use std::fmt;

/// A lookup key, classified at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SearchKey {
    /// Digits only: an ISBN-10/13 or an item id.
    Numeric(String),
    /// Free text, typically a title.
    Text(String),
}

impl SearchKey {
    /// Classify a raw key. Returns `None` for empty or whitespace-only input.
    ///
    /// # Algorithm
    ///
    /// 1. Trim; empty → `None`.
    /// 2. If every whitespace-separated token is digits (after dropping `-`
    ///    and a trailing `.0`), it is numeric: a single cell holding both an
    ///    ISBN-10 and an ISBN-13 keeps the longest token, separated digit
    ///    groups of one identifier are joined.
    /// 3. Anything else is text, with inner whitespace runs collapsed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let tokens: Vec<String> = raw
            .split_whitespace()
            .map(|t| t.strip_suffix(".0").unwrap_or(t).replace('-', ""))
            .collect();

        if tokens
            .iter()
            .all(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
        {
            let isbns: Vec<&String> = tokens
                .iter()
                .filter(|t| t.len() == 10 || t.len() == 13)
                .collect();
            let digits = if tokens.len() > 1 && isbns.len() == tokens.len() {
                // Paired ISBN-10 / ISBN-13 cell: prefer the longer one.
                isbns
                    .into_iter()
                    .max_by_key(|t| t.len())
                    .cloned()
                    .unwrap_or_default()
            } else {
                tokens.concat()
            };
            return Some(Self::Numeric(digits));
        }

        Some(Self::Text(raw.split_whitespace().collect::<Vec<_>>().join(" ")))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Numeric(s) | Self::Text(s) => s,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }

    /// True for a 13-digit numeric key.
    pub fn is_isbn13(&self) -> bool {
        matches!(self, Self::Numeric(s) if s.len() == 13)
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(s: &str) -> Option<SearchKey> {
        Some(SearchKey::Numeric(s.into()))
    }

    fn text(s: &str) -> Option<SearchKey> {
        Some(SearchKey::Text(s.into()))
    }

    #[test]
    fn plain_isbn_is_numeric() {
        assert_eq!(SearchKey::parse("9788937460449"), numeric("9788937460449"));
        assert_eq!(SearchKey::parse("8937460440"), numeric("8937460440"));
    }

    #[test]
    fn float_artifact_stripped() {
        assert_eq!(SearchKey::parse("9788937460449.0"), numeric("9788937460449"));
    }

    #[test]
    fn hyphens_and_spaced_groups_joined() {
        assert_eq!(
            SearchKey::parse("978-89-374-6044-9"),
            numeric("9788937460449")
        );
        assert_eq!(
            SearchKey::parse("978 89 374 6044 9"),
            numeric("9788937460449")
        );
    }

    #[test]
    fn paired_isbn_prefers_thirteen_digits() {
        assert_eq!(
            SearchKey::parse("8937460440 9788937460449"),
            numeric("9788937460449")
        );
    }

    #[test]
    fn item_id_is_numeric() {
        assert_eq!(SearchKey::parse("  12345678 "), numeric("12345678"));
    }

    #[test]
    fn title_is_text() {
        assert_eq!(SearchKey::parse("데미안"), text("데미안"));
        assert_eq!(SearchKey::parse("1984"), numeric("1984"));
        assert_eq!(SearchKey::parse("1984 (개정판)"), text("1984 (개정판)"));
    }

    #[test]
    fn text_whitespace_collapsed() {
        assert_eq!(
            SearchKey::parse("  The   Old Man  and the Sea "),
            text("The Old Man and the Sea")
        );
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(SearchKey::parse(""), None);
        assert_eq!(SearchKey::parse("   "), None);
    }

    #[test]
    fn lone_hyphen_is_text() {
        assert_eq!(SearchKey::parse("-"), text("-"));
    }

    #[test]
    fn isbn13_detection() {
        assert!(SearchKey::parse("9788937460449").unwrap().is_isbn13());
        assert!(!SearchKey::parse("8937460440").unwrap().is_isbn13());
        assert!(!SearchKey::parse("데미안").unwrap().is_isbn13());
    }
}
