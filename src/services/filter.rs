//! Volatile-content pattern filter.
//!
//! Recognizes text belonging to regions that change on every render
//! (live counters, statistics panels) so the normalizer can drop them.

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, Result};

/// Case-insensitive set of volatile-text patterns.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    patterns: Vec<Regex>,
}

impl PatternFilter {
    /// Compile the given patterns. Any invalid pattern rejects the whole set.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| AppError::pattern(p, e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// True if any pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        !text.is_empty() && self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
