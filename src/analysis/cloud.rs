// Word-cloud data: word frequencies scaled to the most common word.
//
// Unlike the query tables, the cloud uses every answer (no duplicate
// suppression) and a word-level tokenizer: runs of word characters with
// inner apostrophes, lowercased, possessive 's dropped, numbers skipped.
// A plural is folded into its singular when both appear ("crates" counts
// as "crate"). Bigram collocations are not added.
// Drawing the cloud is left to whatever consumes the weights.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::frequency::combined_text;
use super::stopwords::StopWords;
use crate::reddit::questions::Question;

/// Words kept in a cloud unless asked otherwise.
pub const DEFAULT_MAX_WORDS: usize = 200;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w[\w']+").expect("word pattern is valid"))
}

/// A word, its raw count, and its size relative to the top word (0.0 to 1.0].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordWeight {
    pub word: String,
    pub count: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordCloud {
    /// Heaviest first
    pub words: Vec<WordWeight>,
}

impl WordCloud {
    /// Cloud over all questions' titles, bodies and answers.
    pub fn from_questions(questions: &[Question], stop_words: &StopWords, max_words: usize) -> Self {
        Self::from_text(&combined_text(questions, false), stop_words, max_words)
    }

    /// Cloud over arbitrary text.
    pub fn from_text(text: &str, stop_words: &StopWords, max_words: usize) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for m in word_pattern().find_iter(text) {
            let lower = m.as_str().to_lowercase();
            let word = lower.strip_suffix("'s").unwrap_or(&lower);
            if word.chars().all(|c| c.is_ascii_digit()) || stop_words.contains(word) {
                continue;
            }
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }

        merge_plurals(&mut counts);

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_words);

        let max_count = ranked.first().map(|(_, c)| *c).unwrap_or(0);
        let words = ranked
            .into_iter()
            .map(|(word, count)| WordWeight {
                word,
                count,
                weight: count as f64 / max_count as f64,
            })
            .collect();

        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Fold "words" into "word" when "word" was also seen. Words ending in
/// "ss" are left alone.
fn merge_plurals(counts: &mut HashMap<String, usize>) {
    let plurals: Vec<String> = counts
        .keys()
        .filter(|w| w.ends_with('s') && !w.ends_with("ss"))
        .filter(|w| counts.contains_key(&w[..w.len() - 1]))
        .cloned()
        .collect();

    for plural in plurals {
        if let Some(count) = counts.remove(&plural) {
            let singular = &plural[..plural.len() - 1];
            *counts.entry(singular.to_string()).or_insert(0) += count;
        }
    }
}
