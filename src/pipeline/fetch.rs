// Fetch pipeline: validate, fetch questions, cache the snapshot.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::reddit::questions::FetchOptions;
use crate::reddit::traits::QuestionSource;
use crate::snapshot::Snapshot;

/// Fetch questions from `source` and save them to `snapshot_path`.
///
/// Options are validated before any request is made. The snapshot is only
/// written when the fetch succeeds, so a failed fetch leaves the previous
/// one in place.
pub async fn run(
    source: &dyn QuestionSource,
    options: &FetchOptions,
    snapshot_path: &Path,
) -> Result<Snapshot> {
    options.validate()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg} ({elapsed})")
            .unwrap(),
    );
    spinner.set_message(format!(
        "Loading {} {} questions from r/{}...",
        options.num_questions,
        options.sort.label().to_lowercase(),
        options.subreddit_name()
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = source.fetch_questions(options).await;
    spinner.finish_and_clear();
    let questions = result?;

    info!(
        count = questions.len(),
        subreddit = options.subreddit_name(),
        "Fetch complete"
    );

    let snapshot = Snapshot::new(options, questions);
    snapshot.save(snapshot_path)?;
    Ok(snapshot)
}
