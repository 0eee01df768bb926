// N-gram query frequencies over questions and their answers.
//
// All questions are flattened into one text (title, body, answers), split on
// whitespace, stripped of stopwords, and cut into contiguous n-word windows.
// Answers that show up more than once anywhere in the fetch are dropped
// first: bots and copy-pasted replies would otherwise dominate the counts.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::stopwords::StopWords;
use crate::reddit::questions::Question;

/// One n-gram and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCount {
    pub query: String,
    pub count: usize,
}

/// Answers whose exact text appears more than once across all questions.
pub fn repeated_answers(questions: &[Question]) -> HashSet<&str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for answer in questions.iter().flat_map(|q| &q.top_answers) {
        *seen.entry(answer.as_str()).or_insert(0) += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(answer, _)| answer)
        .collect()
}

/// Flatten questions into one whitespace-separated text.
///
/// Each question contributes its title, its body (if any) and its answers.
/// With `suppress_repeated`, answers from `repeated_answers` are left out.
pub fn combined_text(questions: &[Question], suppress_repeated: bool) -> String {
    let repeated = if suppress_repeated {
        repeated_answers(questions)
    } else {
        HashSet::new()
    };

    questions
        .iter()
        .map(|q| {
            let mut parts: Vec<&str> = vec![q.title.as_str()];
            if let Some(body) = q.body.as_deref() {
                parts.push(body);
            }
            parts.extend(
                q.top_answers
                    .iter()
                    .map(String::as_str)
                    .filter(|a| !repeated.contains(a)),
            );
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace tokens that aren't stopwords. Case and punctuation are kept.
pub fn tokenize<'a>(text: &'a str, stop_words: &StopWords) -> Vec<&'a str> {
    text.split_whitespace()
        .filter(|token| !stop_words.contains(token))
        .collect()
}

/// Contiguous `n`-token windows joined by single spaces.
pub fn ngrams(tokens: &[&str], n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// Count n-grams, most frequent first. Ties keep first-occurrence order.
pub fn count_ngrams(tokens: &[&str], n: usize) -> Vec<QueryCount> {
    // query -> (count, index of first occurrence)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (i, gram) in ngrams(tokens, n).into_iter().enumerate() {
        counts.entry(gram).or_insert((0, i)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(query, (count, first))| (query, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(query, count, _)| QueryCount { query, count })
        .collect()
}

/// The most frequent `n`-word queries across questions and their
/// non-repeated answers.
pub fn most_frequent_queries(
    questions: &[Question],
    n: usize,
    stop_words: &StopWords,
) -> Result<Vec<QueryCount>> {
    if n == 0 {
        anyhow::bail!("Query length must be at least one word");
    }

    let text = combined_text(questions, true);
    let tokens = tokenize(&text, stop_words);
    let counts = count_ngrams(&tokens, n);

    debug!(
        n = n,
        tokens = tokens.len(),
        distinct = counts.len(),
        "Counted n-word queries"
    );

    Ok(counts)
}
