// Question fetching: newest or hottest submissions plus their top comments.
//
// A "question" is a subreddit submission (title and self-text) together with
// the first few top-level comments under Reddit's "best" sort, which is what
// the frequency analysis consumes.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::client::RedditClient;
use super::listing::{Child, LinkData, Listing};

/// Upper bound on submissions per fetch.
pub const MAX_QUESTIONS: usize = 900;

/// Upper bound on top answers kept per submission.
pub const MAX_ANSWERS: usize = 5;

/// Reddit serves at most 100 listing items per page.
const PAGE_SIZE: usize = 100;

/// Comment fetches in flight at once. The client's rate limiter still
/// gates the actual request rate.
const COMMENT_CONCURRENCY: usize = 4;

/// Shown in place of an empty self-text.
pub const NO_BODY: &str = "No body content";

/// A submission and its top answers, the unit of analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    /// Self-text, or `None` for link posts and empty bodies.
    pub body: Option<String>,
    /// Top-level comment bodies in "best" order.
    pub top_answers: Vec<String>,
}

impl Question {
    /// Body for display, with a placeholder when there is none.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or(NO_BODY)
    }
}

/// Which subreddit listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSort {
    /// Most recent submissions (`/new`)
    Newest,
    /// Currently trending submissions (`/hot`)
    Hottest,
}

impl QuestionSort {
    /// Listing path segment for this sort.
    pub fn listing(self) -> &'static str {
        match self {
            QuestionSort::Newest => "new",
            QuestionSort::Hottest => "hot",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionSort::Newest => "Newest",
            QuestionSort::Hottest => "Hottest",
        }
    }
}

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub subreddit: String,
    pub sort: QuestionSort,
    pub num_questions: usize,
    pub num_answers: usize,
}

impl FetchOptions {
    /// Subreddit name without any `r/` or `/r/` prefix.
    pub fn subreddit_name(&self) -> &str {
        let name = self.subreddit.trim();
        let name = name.strip_prefix('/').unwrap_or(name);
        name.strip_prefix("r/").unwrap_or(name)
    }

    /// Check the subreddit name and the count ranges.
    pub fn validate(&self) -> Result<()> {
        let name = self.subreddit_name();
        if name.is_empty() {
            anyhow::bail!("Subreddit name is empty");
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            anyhow::bail!(
                "Invalid subreddit name {name:?}: only letters, digits and underscores are allowed"
            );
        }
        if !(1..=MAX_QUESTIONS).contains(&self.num_questions) {
            anyhow::bail!(
                "Number of questions must be between 1 and {MAX_QUESTIONS}, got {}",
                self.num_questions
            );
        }
        if self.num_answers > MAX_ANSWERS {
            anyhow::bail!(
                "Number of answers must be between 0 and {MAX_ANSWERS}, got {}",
                self.num_answers
            );
        }
        Ok(())
    }
}

/// Fetch submissions and their top answers.
///
/// Submissions keep listing order. A failed comment fetch only costs that
/// submission its answers; a failed listing fetch fails the whole call.
pub async fn fetch_latest_questions(
    client: &RedditClient,
    options: &FetchOptions,
) -> Result<Vec<Question>> {
    options.validate()?;
    let subreddit = options.subreddit_name();

    let links = fetch_submissions(client, subreddit, options.sort, options.num_questions).await?;

    if options.num_answers == 0 {
        return Ok(links
            .into_iter()
            .map(|link| question_from_link(link, Vec::new()))
            .collect());
    }

    let pending: Vec<_> = links
        .into_iter()
        .map(|link| question_with_answers(client, subreddit, link, options.num_answers))
        .collect();
    let questions: Vec<Question> = stream::iter(pending)
        .buffered(COMMENT_CONCURRENCY)
        .collect()
        .await;

    info!(
        count = questions.len(),
        subreddit = subreddit,
        sort = options.sort.label(),
        "Collected questions for analysis"
    );

    Ok(questions)
}

/// Attach top answers to a submission. A failed comment fetch is logged
/// and leaves the question without answers.
async fn question_with_answers(
    client: &RedditClient,
    subreddit: &str,
    link: LinkData,
    num_answers: usize,
) -> Question {
    let answers = match fetch_top_answers(client, subreddit, &link.id, num_answers).await {
        Ok(answers) => answers,
        Err(e) => {
            warn!(error = %e, id = %link.id, "Failed to fetch answers, skipping");
            Vec::new()
        }
    };
    question_from_link(link, answers)
}

/// Page through a subreddit listing until `max` submissions are collected
/// or the listing runs out.
async fn fetch_submissions(
    client: &RedditClient,
    subreddit: &str,
    sort: QuestionSort,
    max: usize,
) -> Result<Vec<LinkData>> {
    let path = format!("/r/{}/{}", subreddit, sort.listing());
    let mut links = Vec::new();
    let mut after: Option<String> = None;

    loop {
        let limit = (max - links.len()).min(PAGE_SIZE).to_string();
        let mut params: Vec<(&str, &str)> = vec![("limit", limit.as_str())];
        if let Some(ref cursor) = after {
            params.push(("after", cursor.as_str()));
        }

        let listing: Listing = client
            .api_get(&path, &params)
            .await
            .with_context(|| format!("Failed to fetch {} posts from r/{}", sort.label(), subreddit))?;

        let (page, next) = links_from_listing(listing);
        let page_len = page.len();

        for link in page {
            if links.len() >= max {
                break;
            }
            links.push(link);
        }

        debug!(
            page_posts = page_len,
            total_collected = links.len(),
            "Fetched page of submissions from r/{}",
            subreddit
        );

        if links.len() >= max || page_len == 0 {
            break;
        }
        after = next;
        if after.is_none() {
            break;
        }
    }

    Ok(links)
}

/// Fetch the first `count` top-level comments of a submission, best first.
async fn fetch_top_answers(
    client: &RedditClient,
    subreddit: &str,
    id: &str,
    count: usize,
) -> Result<Vec<String>> {
    let path = format!("/r/{}/comments/{}", subreddit, id);
    let limit = count.to_string();

    // The comments endpoint returns [submission listing, comment listing].
    let listings: Vec<Listing> = client
        .api_get(
            &path,
            &[("sort", "best"), ("limit", limit.as_str()), ("depth", "1")],
        )
        .await
        .with_context(|| format!("Failed to fetch comments for {id}"))?;

    Ok(top_answers(&listings, count))
}

/// Submissions from one listing page plus the `after` cursor.
pub fn links_from_listing(listing: Listing) -> (Vec<LinkData>, Option<String>) {
    let links = listing
        .data
        .children
        .iter()
        .filter_map(|thing| match thing.decode() {
            Ok(Child::Link(link)) => Some(link),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, kind = %thing.kind, "Skipping malformed listing entry");
                None
            }
        })
        .collect();
    (links, listing.data.after)
}

/// First `count` comment bodies from a comments response, skipping
/// "load more" placeholders.
pub fn top_answers(listings: &[Listing], count: usize) -> Vec<String> {
    let Some(comments) = listings.get(1) else {
        return Vec::new();
    };

    comments
        .data
        .children
        .iter()
        .filter_map(|thing| match thing.decode() {
            Ok(Child::Comment(comment)) => Some(comment.body),
            _ => None,
        })
        .take(count)
        .collect()
}

/// Build a question from a submission; blank self-text becomes `None`.
pub fn question_from_link(link: LinkData, top_answers: Vec<String>) -> Question {
    let body = if link.selftext.trim().is_empty() {
        None
    } else {
        Some(link.selftext)
    };
    Question {
        id: link.id,
        title: link.title,
        body,
        top_answers,
    }
}
