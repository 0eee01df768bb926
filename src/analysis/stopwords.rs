// Stopword sets: the English list plus user-supplied extras.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

/// A case-insensitive stopword set.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// An empty set. Nothing is filtered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The NLTK English list: pronouns, articles, auxiliaries and other
    /// function words, but no content words like "best" or "work".
    pub fn english() -> Self {
        let mut set = Self::empty();
        set.extend(get(LANGUAGE::English));
        set
    }

    /// English stopwords plus a comma-separated list of custom words.
    pub fn with_custom(custom: &str) -> Self {
        let mut set = Self::english();
        set.extend(parse_custom(custom));
        set
    }

    /// Add words; they are stored lowercased.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    /// Whether `word` is a stopword, ignoring case.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Split a comma-separated stopword list: trimmed, lowercased, blanks dropped.
pub fn parse_custom(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
