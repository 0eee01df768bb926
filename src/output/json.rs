// JSON export of an analysis, for spreadsheets and other tooling.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::cloud::WordCloud;
use crate::analysis::tables::QueryTables;
use crate::reddit::questions::QuestionSort;
use crate::snapshot::Snapshot;

/// Everything an analysis produced, minus the raw questions.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisExport {
    pub subreddit: String,
    pub sort: QuestionSort,
    pub question_count: usize,
    pub fetched_at: DateTime<Utc>,
    pub custom_stopwords: Vec<String>,
    pub tables: QueryTables,
    pub word_cloud: WordCloud,
}

impl AnalysisExport {
    pub fn new(
        snapshot: &Snapshot,
        tables: QueryTables,
        word_cloud: WordCloud,
        custom_stopwords: Vec<String>,
    ) -> Self {
        Self {
            subreddit: snapshot.subreddit.clone(),
            sort: snapshot.sort,
            question_count: snapshot.questions.len(),
            fetched_at: snapshot.fetched_at,
            custom_stopwords,
            tables,
            word_cloud,
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write(&self, path: &str) -> Result<String> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize analysis")?;
        fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
        info!(path = path, "JSON export written");
        Ok(path.to_string())
    }
}
