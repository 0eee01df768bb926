// Colored terminal output for query tables, questions and the word cloud.

use colored::Colorize;

use crate::analysis::cloud::WordCloud;
use crate::analysis::tables::QueryTables;
use crate::snapshot::Snapshot;

/// Width of the widest word-cloud bar.
const CLOUD_BAR_WIDTH: usize = 30;

/// Display the first `top` rows of every query table.
pub fn display_query_tables(tables: &QueryTables, top: usize) {
    println!("\n{}", "=== Most Frequent Queries ===".bold());

    for table in &tables.tables {
        println!("\n  {}", table.title().bold());

        let rows = table.top(top);
        if rows.is_empty() {
            println!("    {}", "(no queries)".dimmed());
            continue;
        }

        println!(
            "    {:>4}  {:<48} {:>6}",
            "#".dimmed(),
            "Query".dimmed(),
            "Count".dimmed()
        );
        println!("    {}", "-".repeat(60).dimmed());

        for (i, row) in rows.iter().enumerate() {
            let query = super::truncate_chars(&row.query, 45);
            println!("    {:>4}  {:<48} {:>6}", i + 1, query, row.count);
        }
    }
    println!();
}

/// Display the fetched questions with their numbered top answers.
pub fn display_questions(snapshot: &Snapshot) {
    if snapshot.questions.is_empty() {
        println!("No questions in the last fetch.");
        return;
    }

    println!("\n{}", format!("=== {} ===", snapshot.heading()).bold());
    println!(
        "{}",
        format!("Fetched {}", snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC")).dimmed()
    );

    for (idx, question) in snapshot.questions.iter().enumerate() {
        println!("\n{}", format!("{}. {}", idx + 1, question.title).bold());
        println!("{}", question.body_text());

        if snapshot.num_answers > 0 {
            println!("\n  {}", "Top Upvoted Answers:".underline());
            if question.top_answers.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for (ans_idx, answer) in question.top_answers.iter().enumerate() {
                println!("  {}- {}", ans_idx + 1, answer);
            }
        }
        println!("{}", "---".dimmed());
    }
}

/// Display the heaviest `limit` words of a cloud as scaled bars.
pub fn display_word_cloud(cloud: &WordCloud, limit: usize) {
    if cloud.is_empty() {
        println!("Word cloud is empty: no words left after stopword filtering.");
        return;
    }

    println!("\n{}", "=== Word Cloud ===".bold());
    println!();

    for entry in cloud.words.iter().take(limit) {
        let filled = ((entry.weight * CLOUD_BAR_WIDTH as f64).round() as usize).max(1);
        let bar = "#".repeat(filled);

        let colored_bar = if entry.weight >= 0.66 {
            bar.bright_green()
        } else if entry.weight >= 0.33 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!(
            "  {:<24} {:<width$} {:>5}",
            super::truncate_chars(&entry.word, 21),
            colored_bar,
            entry.count,
            width = CLOUD_BAR_WIDTH
        );
    }
    println!();
}
