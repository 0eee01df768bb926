// Markdown report: every query table, the word-cloud head and the questions.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::analysis::cloud::WordCloud;
use crate::analysis::tables::QueryTables;
use crate::snapshot::Snapshot;

/// Words from the cloud listed in the report.
const REPORT_CLOUD_WORDS: usize = 50;

/// Render the report as a Markdown string.
pub fn render_report(
    snapshot: &Snapshot,
    tables: &QueryTables,
    cloud: &WordCloud,
    custom_stopwords: &[String],
) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Query Frequency Report: r/{}\n", snapshot.subreddit);
    let _ = writeln!(
        md,
        "Generated {}. {} fetched {}, up to {} top answers each.\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        snapshot.heading(),
        snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC"),
        snapshot.num_answers,
    );
    if !custom_stopwords.is_empty() {
        let _ = writeln!(md, "Custom stopwords: {}\n", custom_stopwords.join(", "));
    }

    for table in &tables.tables {
        let _ = writeln!(md, "## {}\n", table.title());
        if table.rows.is_empty() {
            md.push_str("_No queries._\n\n");
            continue;
        }
        md.push_str("| # | Query | Count |\n|---:|---|---:|\n");
        for (i, row) in table.rows.iter().enumerate() {
            let _ = writeln!(md, "| {} | {} | {} |", i + 1, escape_cell(&row.query), row.count);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Word Cloud\n");
    if cloud.is_empty() {
        md.push_str("_No words._\n\n");
    } else {
        md.push_str("| Word | Count | Weight |\n|---|---:|---:|\n");
        for entry in cloud.words.iter().take(REPORT_CLOUD_WORDS) {
            let _ = writeln!(
                md,
                "| {} | {} | {:.2} |",
                escape_cell(&entry.word),
                entry.count,
                entry.weight
            );
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## {}\n", snapshot.heading());
    for (idx, question) in snapshot.questions.iter().enumerate() {
        let _ = writeln!(md, "### {}. {}\n", idx + 1, question.title.trim());
        let _ = writeln!(md, "{}\n", question.body_text().trim());
        if snapshot.num_answers > 0 && !question.top_answers.is_empty() {
            md.push_str("#### Top Upvoted Answers\n\n");
            for (ans_idx, answer) in question.top_answers.iter().enumerate() {
                let _ = writeln!(md, "{}- {}", ans_idx + 1, super::single_line(answer));
            }
            md.push('\n');
        }
        md.push_str("---\n\n");
    }

    md
}

/// Write the report to `path`, creating parent directories. Returns the path
/// as written, for display.
pub fn generate_report(
    snapshot: &Snapshot,
    tables: &QueryTables,
    cloud: &WordCloud,
    custom_stopwords: &[String],
    path: &str,
) -> Result<String> {
    let md = render_report(snapshot, tables, cloud, custom_stopwords);

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, md).with_context(|| format!("Failed to write report to {path}"))?;

    info!(path = path, "Markdown report written");
    Ok(path.to_string())
}

/// Make text safe inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    super::single_line(text).replace('|', "\\|")
}
