// Query tables: the 1-, 2- and 3-word frequency tables shown to the user.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::frequency::{most_frequent_queries, QueryCount};
use super::stopwords::StopWords;
use crate::reddit::questions::Question;

/// Query lengths that get a table.
pub const NGRAM_SIZES: [usize; 3] = [1, 2, 3];

/// Rows kept per table.
pub const MAX_TABLE_ROWS: usize = 100;

/// Most frequent queries of one length, highest count first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTable {
    /// Words per query
    pub n: usize,
    pub rows: Vec<QueryCount>,
}

impl QueryTable {
    pub fn title(&self) -> String {
        format!("{}-Word Queries", self.n)
    }

    /// The first `k` rows (fewer if the table is shorter).
    pub fn top(&self, k: usize) -> &[QueryCount] {
        &self.rows[..k.min(self.rows.len())]
    }
}

/// One table per entry in `NGRAM_SIZES`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTables {
    pub tables: Vec<QueryTable>,
}

impl QueryTables {
    /// Build every table, each truncated to `MAX_TABLE_ROWS`.
    pub fn build(questions: &[Question], stop_words: &StopWords) -> Result<Self> {
        let tables = NGRAM_SIZES
            .iter()
            .map(|&n| {
                let mut rows = most_frequent_queries(questions, n, stop_words)?;
                rows.truncate(MAX_TABLE_ROWS);
                Ok(QueryTable { n, rows })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tables })
    }

    /// The table for `n`-word queries, if one was built.
    pub fn get(&self, n: usize) -> Option<&QueryTable> {
        self.tables.iter().find(|t| t.n == n)
    }

    /// The first `k` rows of the `n`-word table; empty if there's no such table.
    pub fn top(&self, n: usize, k: usize) -> &[QueryCount] {
        self.get(n).map(|t| t.top(k)).unwrap_or(&[])
    }
}
