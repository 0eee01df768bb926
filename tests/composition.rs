// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   QuestionSource -> fetch pipeline -> Snapshot -> QueryTables / WordCloud -> report
// using an in-memory source instead of Reddit. Snapshots and reports are
// written under the system temp directory.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use subsift::analysis::cloud::WordCloud;
use subsift::analysis::stopwords::{parse_custom, StopWords};
use subsift::analysis::tables::QueryTables;
use subsift::output::json::AnalysisExport;
use subsift::output::markdown::{generate_report, render_report};
use subsift::output::truncate_chars;
use subsift::reddit::questions::{FetchOptions, Question, QuestionSort};
use subsift::reddit::traits::QuestionSource;
use subsift::snapshot::Snapshot;

/// Serves a fixed set of questions, truncated to the requested count.
struct FixedSource {
    questions: Vec<Question>,
    calls: AtomicUsize,
}

impl FixedSource {
    fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuestionSource for FixedSource {
    async fn fetch_questions(&self, options: &FetchOptions) -> Result<Vec<Question>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .questions
            .iter()
            .take(options.num_questions)
            .cloned()
            .map(|mut q| {
                q.top_answers.truncate(options.num_answers);
                q
            })
            .collect())
    }
}

struct FailingSource;

#[async_trait]
impl QuestionSource for FailingSource {
    async fn fetch_questions(&self, _options: &FetchOptions) -> Result<Vec<Question>> {
        anyhow::bail!("Reddit API /r/rust/new returned 503 Service Unavailable")
    }
}

fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: "q1".to_string(),
            title: "How do I learn async Rust?".to_string(),
            body: Some("Async Rust feels confusing coming from Python.".to_string()),
            top_answers: vec![
                "Read the async book and build a small tokio project.".to_string(),
                "I am a bot. Please read the FAQ.".to_string(),
            ],
        },
        Question {
            id: "q2".to_string(),
            title: "Best tokio project ideas?".to_string(),
            body: None,
            top_answers: vec![
                "A chat server is a classic tokio project.".to_string(),
                "I am a bot. Please read the FAQ.".to_string(),
            ],
        },
        Question {
            id: "q3".to_string(),
            title: "Is async Rust worth it?".to_string(),
            body: Some("Genuinely asking | curious".to_string()),
            top_answers: vec![],
        },
    ]
}

fn options(num_questions: usize, num_answers: usize) -> FetchOptions {
    FetchOptions {
        subreddit: "r/rust".to_string(),
        sort: QuestionSort::Hottest,
        num_questions,
        num_answers,
    }
}

/// A unique scratch path under the temp dir for this test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("subsift-test-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

// ============================================================
// Chain: source -> pipeline -> snapshot
// ============================================================

#[tokio::test]
async fn fetch_pipeline_saves_snapshot() {
    let dir = scratch("pipeline");
    let path = dir.join("nested").join("last_fetch.json");
    let source = FixedSource::new(sample_questions());

    let snapshot = subsift::pipeline::fetch::run(&source, &options(2, 1), &path)
        .await
        .unwrap();

    assert_eq!(snapshot.subreddit, "rust");
    assert_eq!(snapshot.sort, QuestionSort::Hottest);
    assert_eq!(snapshot.questions.len(), 2);
    assert!(snapshot.questions.iter().all(|q| q.top_answers.len() <= 1));

    let loaded = Snapshot::load(&path).unwrap();
    assert_eq!(loaded.questions, snapshot.questions);
    assert_eq!(loaded.fetched_at, snapshot.fetched_at);
    assert_eq!(loaded.heading(), "2 Hottest Questions from r/rust");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn invalid_options_never_reach_the_source() {
    let dir = scratch("invalid");
    let path = dir.join("last_fetch.json");
    let source = FixedSource::new(sample_questions());

    let result = subsift::pipeline::fetch::run(&source, &options(0, 1), &path).await;

    assert!(result.is_err());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert!(!path.exists());
}

#[tokio::test]
async fn failed_fetch_keeps_previous_snapshot() {
    let dir = scratch("failed");
    let path = dir.join("last_fetch.json");

    let good = FixedSource::new(sample_questions());
    subsift::pipeline::fetch::run(&good, &options(3, 2), &path)
        .await
        .unwrap();

    let result = subsift::pipeline::fetch::run(&FailingSource, &options(3, 2), &path).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("503"));

    let kept = Snapshot::load_optional(&path).unwrap().unwrap();
    assert_eq!(kept.questions.len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn load_optional_missing_snapshot_is_none() {
    let dir = scratch("missing");
    assert!(Snapshot::load_optional(&dir.join("nope.json"))
        .unwrap()
        .is_none());
}

#[test]
fn load_rejects_corrupt_snapshot() {
    let dir = scratch("corrupt");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("last_fetch.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(Snapshot::load_optional(&path).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================
// Chain: snapshot -> tables / cloud
// ============================================================

#[test]
fn bot_answers_are_excluded_from_tables_but_not_cloud() {
    let questions = sample_questions();
    let stop_words = StopWords::english();

    let tables = QueryTables::build(&questions, &stop_words).unwrap();
    let unigrams: Vec<&str> = tables
        .get(1)
        .unwrap()
        .rows
        .iter()
        .map(|r| r.query.as_str())
        .collect();
    assert!(!unigrams.contains(&"FAQ."));
    assert!(!unigrams.contains(&"bot."));

    let cloud = WordCloud::from_questions(&questions, &stop_words, 100);
    assert!(cloud.words.iter().any(|w| w.word == "faq"));
}

#[test]
fn repeated_bigram_ranks_first() {
    // "tokio project." closes both non-bot answers. Case and punctuation are
    // part of the token, so "async Rust?" and "Async Rust" never merge.
    let tables = QueryTables::build(&sample_questions(), &StopWords::empty()).unwrap();
    let top = &tables.top(2, 1)[0];
    assert_eq!(top.query, "tokio project.");
    assert_eq!(top.count, 2);

    let bigrams = &tables.get(2).unwrap().rows;
    for variant in ["async Rust?", "Async Rust", "async Rust"] {
        let row = bigrams.iter().find(|r| r.query == variant).unwrap();
        assert_eq!(row.count, 1, "{variant}");
    }
}

#[test]
fn update_with_custom_stopwords_changes_tables() {
    let questions = sample_questions();

    let before = QueryTables::build(&questions, &StopWords::english()).unwrap();
    assert!(before.get(1).unwrap().rows.iter().any(|r| r.query == "tokio"));

    let after = QueryTables::build(&questions, &StopWords::with_custom("tokio, Async")).unwrap();
    let unigrams: Vec<&str> = after.get(1).unwrap().rows.iter().map(|r| r.query.as_str()).collect();
    assert!(!unigrams.contains(&"tokio"));
    assert!(!unigrams.contains(&"async"));
    assert!(!unigrams.contains(&"Async"));
}

// ============================================================
// Chain: analysis -> report
// ============================================================

#[test]
fn markdown_report_contains_all_sections() {
    let snapshot = Snapshot::new(&options(3, 2), sample_questions());
    let stop_words = StopWords::english();
    let tables = QueryTables::build(&snapshot.questions, &stop_words).unwrap();
    let cloud = WordCloud::from_questions(&snapshot.questions, &stop_words, 200);
    let custom = parse_custom("foo, bar");

    let md = render_report(&snapshot, &tables, &cloud, &custom);

    assert!(md.starts_with("# Query Frequency Report: r/rust"));
    assert!(md.contains("## 1-Word Queries"));
    assert!(md.contains("## 2-Word Queries"));
    assert!(md.contains("## 3-Word Queries"));
    assert!(md.contains("## Word Cloud"));
    assert!(md.contains("Custom stopwords: foo, bar"));
    assert!(md.contains("## 3 Hottest Questions from r/rust"));
    assert!(md.contains("No body content"));
    // Pipes in question bodies don't break table cells; bodies aren't in cells.
    assert!(md.contains("Genuinely asking | curious"));
}

#[test]
fn report_files_are_written() {
    let dir = scratch("report");
    let snapshot = Snapshot::new(&options(3, 2), sample_questions());
    let stop_words = StopWords::english();
    let tables = QueryTables::build(&snapshot.questions, &stop_words).unwrap();
    let cloud = WordCloud::from_questions(&snapshot.questions, &stop_words, 200);

    let md_path = dir.join("out").join("report.md");
    let written = generate_report(
        &snapshot,
        &tables,
        &cloud,
        &[],
        md_path.to_str().unwrap(),
    )
    .unwrap();
    assert!(std::fs::read_to_string(&written)
        .unwrap()
        .contains("## 1-Word Queries"));

    let json_path = dir.join("report.json");
    let export = AnalysisExport::new(&snapshot, tables, cloud, vec!["foo".to_string()]);
    export.write(json_path.to_str().unwrap()).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed["subreddit"], "rust");
    assert_eq!(parsed["sort"], "hottest");
    assert_eq!(parsed["question_count"], 3);
    assert_eq!(parsed["tables"]["tables"].as_array().unwrap().len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn truncate_chars_is_utf8_safe() {
    assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    assert_eq!(truncate_chars("short", 10), "short");
}
