// Question source trait: where the analysis gets its questions from.
//
// RedditClient is the real implementation. Tests and offline runs plug in
// their own sources so the pipeline can be exercised without the network.

use anyhow::Result;
use async_trait::async_trait;

use super::client::RedditClient;
use super::questions::{fetch_latest_questions, FetchOptions, Question};

/// Anything that can produce questions for a set of fetch options.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch questions and their top answers, in listing order.
    async fn fetch_questions(&self, options: &FetchOptions) -> Result<Vec<Question>>;
}

#[async_trait]
impl QuestionSource for RedditClient {
    async fn fetch_questions(&self, options: &FetchOptions) -> Result<Vec<Question>> {
        fetch_latest_questions(self, options).await
    }
}
