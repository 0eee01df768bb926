// Snapshot of the last fetch, cached on disk as JSON.
//
// Fetching is the slow, rate-limited part. Keeping the raw questions lets
// `update`, `questions`, `cloud` and `report` re-run the analysis with new
// stopwords without going back to Reddit.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::reddit::questions::{FetchOptions, Question, QuestionSort};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub subreddit: String,
    pub sort: QuestionSort,
    /// Requested, not necessarily received (small subreddits run out).
    pub num_questions: usize,
    pub num_answers: usize,
    pub fetched_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl Snapshot {
    /// Wrap freshly fetched questions with the options that produced them.
    pub fn new(options: &FetchOptions, questions: Vec<Question>) -> Self {
        Self {
            subreddit: options.subreddit_name().to_string(),
            sort: options.sort,
            num_questions: options.num_questions,
            num_answers: options.num_answers,
            fetched_at: Utc::now(),
            questions,
        }
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        info!(
            path = %path.display(),
            questions = self.questions.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Read a snapshot written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Snapshot {} is not valid", path.display()))
    }

    /// Like `load`, but `None` when no snapshot exists yet.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Header line used by the question list and the report.
    pub fn heading(&self) -> String {
        format!(
            "{} {} Questions from r/{}",
            self.questions.len(),
            self.sort.label(),
            self.subreddit
        )
    }
}
