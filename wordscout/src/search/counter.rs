use crate::errors::{Result, ScanError};

/// Counts non-overlapping, case-sensitive literal occurrences of `term` in
/// `text`, scanning left to right and resuming after each match.
///
/// "aa" in "aaa" counts once.
pub fn count_occurrences(text: &str, term: &str) -> Result<usize> {
    Ok(OccurrenceCounter::new(term)?.count(text))
}

/// A validated, reusable counter for one search term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceCounter {
    term: String,
}

impl OccurrenceCounter {
    /// Creates a counter, rejecting the empty term
    pub fn new(term: impl Into<String>) -> Result<Self> {
        let term = term.into();
        if term.is_empty() {
            return Err(ScanError::invalid_argument("search term must not be empty"));
        }
        Ok(Self { term })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Counts occurrences of the term in `text`
    pub fn count(&self, text: &str) -> usize {
        text.matches(self.term.as_str()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_counting() {
        assert_eq!(count_occurrences("cat cat dog", "cat").unwrap(), 2);
        assert_eq!(count_occurrences("no match here", "cat").unwrap(), 0);
        assert_eq!(count_occurrences("", "cat").unwrap(), 0);
    }

    #[test]
    fn test_non_overlapping() {
        assert_eq!(count_occurrences("aaa", "aa").unwrap(), 1);
        assert_eq!(count_occurrences("aaaa", "aa").unwrap(), 2);
        assert_eq!(count_occurrences("abababa", "aba").unwrap(), 2);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(count_occurrences("Cat cat CAT", "cat").unwrap(), 1);
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(count_occurrences("héllo héllo", "é").unwrap(), 2);
        assert_eq!(count_occurrences("日本語と日本", "日本").unwrap(), 2);
    }

    #[test]
    fn test_term_spanning_lines() {
        assert_eq!(count_occurrences("end\nstart end\nstart", "end\nstart").unwrap(), 2);
    }

    #[test]
    fn test_empty_term_rejected() {
        assert!(matches!(
            count_occurrences("anything", ""),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(OccurrenceCounter::new("").is_err());
    }

    #[test]
    fn test_matches_split_semantics() {
        let samples = [
            ("cat cat dog", "cat"),
            ("aaa", "aa"),
            ("xxxxx", "xx"),
            ("abc", "abcd"),
            ("a,b,,c,", ","),
            ("TODO TODO\nTODO", "TODO"),
        ];
        for (text, term) in samples {
            let expected = text.split(term).count() - 1;
            assert_eq!(
                count_occurrences(text, term).unwrap(),
                expected,
                "text {:?} term {:?}",
                text,
                term
            );
        }
    }

    #[test]
    fn test_counter_reuse() {
        let counter = OccurrenceCounter::new("TODO").unwrap();
        assert_eq!(counter.term(), "TODO");
        assert_eq!(counter.count("TODO: one"), 1);
        assert_eq!(counter.count("TODO TODO"), 2);
    }
}
