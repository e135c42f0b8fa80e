//! Case-insensitive text matching for list filters.

/// A normalized search needle.
///
/// ```
/// use pharmship_core::TextQuery;
///
/// let query = TextQuery::new("  insulin ");
/// assert!(query.matches(["Insulin Glargine", "Sanofi"]));
/// assert!(!query.matches(["Metformin", "Teva"]));
/// assert!(TextQuery::new("").matches(["anything"]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery(String);

impl TextQuery {
    /// Build a query from raw user input.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Build a query from an optional query-string parameter.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.map(Self::new).unwrap_or_default()
    }

    /// Whether the query matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized needle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the query is empty or any field contains it.
    pub fn matches<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.is_empty()
            || fields
                .into_iter()
                .any(|field| field.to_lowercase().contains(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_any_field() {
        let query = TextQuery::new("SARAH");
        assert!(query.matches(["Sarah Johnson", "sarah.j@email.com"]));
        assert!(query.matches(["Michael Chen", "sarah@example.com"]));
        assert!(!query.matches(["Michael Chen", "michael.c@email.com"]));
    }

    #[test]
    fn test_blank_query_matches_everything() {
        assert!(TextQuery::new("   ").matches(["x"]));
        assert!(TextQuery::from_param(None).matches([]));
    }

    #[test]
    fn test_no_fields_never_match_non_empty_query() {
        assert!(!TextQuery::new("a").matches([]));
    }
}
