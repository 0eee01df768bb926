use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use subsift::analysis::cloud::{WordCloud, DEFAULT_MAX_WORDS};
use subsift::analysis::stopwords::{parse_custom, StopWords};
use subsift::analysis::tables::QueryTables;
use subsift::config::Config;
use subsift::reddit::client::RedditClient;
use subsift::reddit::questions::{FetchOptions, QuestionSort};
use subsift::snapshot::Snapshot;

/// subsift: subreddit question fetcher and query frequency analysis.
///
/// Fetches the newest or hottest questions from a subreddit along with their
/// top answers, then ranks the most frequent 1-, 2- and 3-word queries.
#[derive(Parser)]
#[command(name = "subsift", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Number of rows to show per query table (1-100)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
    top: u32,

    /// Comma-separated words to add to the stopwords (default: SUBSIFT_STOPWORDS)
    #[arg(long)]
    stopwords: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch questions and answers, then analyze them
    Fetch {
        /// Subreddit to analyze (with or without the r/ prefix)
        #[arg(short, long, default_value = "AskReddit")]
        subreddit: String,

        /// Newest for recent questions, hottest for trending ones
        #[arg(long, value_enum, default_value_t = QuestionSort::Newest)]
        sort: QuestionSort,

        /// Number of questions to fetch (1-900). More questions take longer.
        #[arg(short = 'n', long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=900))]
        questions: u32,

        /// Number of top upvoted answers per question (0-5)
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(0..=5))]
        answers: u32,

        /// Require Reddit app credentials instead of falling back to the public API
        #[arg(long)]
        auth: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Re-analyze the last fetch with different stopwords
    Update {
        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// List the questions and answers from the last fetch
    Questions,

    /// Show word-cloud weights for the last fetch
    Cloud {
        /// Number of words to show
        #[arg(long, default_value = "40")]
        max_words: usize,

        /// Comma-separated words to add to the stopwords (default: SUBSIFT_STOPWORDS)
        #[arg(long)]
        stopwords: Option<String>,
    },

    /// Write a report of the last fetch (Markdown, or JSON with --json)
    Report {
        /// Output file path
        #[arg(short, long, default_value = "output/subsift-report.md")]
        output: String,

        /// Write JSON instead of Markdown
        #[arg(long)]
        json: bool,

        /// Comma-separated words to add to the stopwords (default: SUBSIFT_STOPWORDS)
        #[arg(long)]
        stopwords: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("subsift=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Fetch {
            subreddit,
            sort,
            questions,
            answers,
            auth,
            analysis,
        } => {
            if auth {
                config.require_credentials()?;
            }

            let options = FetchOptions {
                subreddit,
                sort,
                num_questions: questions as usize,
                num_answers: answers as usize,
            };
            options.validate()?;

            let client = RedditClient::from_config(&config)?;
            if !client.is_authenticated() {
                println!(
                    "{}",
                    "No Reddit credentials set; using the public API (slower rate limit).".dimmed()
                );
            }

            let snapshot =
                subsift::pipeline::fetch::run(&client, &options, &config.snapshot_path).await?;

            println!(
                "Fetched {} questions from r/{}.",
                snapshot.questions.len(),
                snapshot.subreddit
            );
            if snapshot.questions.len() < options.num_questions {
                println!(
                    "{}",
                    format!(
                        "r/{} only had {} {} questions available.",
                        snapshot.subreddit,
                        snapshot.questions.len(),
                        snapshot.sort.label().to_lowercase()
                    )
                    .yellow()
                );
            }

            analyze_and_display(&snapshot, &config, &analysis)?;
            println!("{}", "Data fetched and analyzed successfully.".green());
            println!(
                "{}",
                "To try other stopwords, run: subsift update --stopwords \"word1, word2\"".dimmed()
            );
        }

        Commands::Update { analysis } => {
            let Some(snapshot) = Snapshot::load_optional(&config.snapshot_path)? else {
                println!(
                    "{}",
                    "No data to update. Please fetch data first.".yellow()
                );
                return Ok(());
            };

            analyze_and_display(&snapshot, &config, &analysis)?;
            println!(
                "{}",
                "Tables and word cloud updated successfully based on new stopwords.".green()
            );
        }

        Commands::Questions => {
            let snapshot = load_snapshot(&config)?;
            subsift::output::terminal::display_questions(&snapshot);
        }

        Commands::Cloud {
            max_words,
            stopwords,
        } => {
            let snapshot = load_snapshot(&config)?;
            let custom = custom_stopwords(stopwords.as_deref(), &config);
            let stop_words = stop_words_with(&custom);
            let cloud = WordCloud::from_questions(&snapshot.questions, &stop_words, max_words);
            subsift::output::terminal::display_word_cloud(&cloud, max_words);
        }

        Commands::Report {
            output,
            json,
            stopwords,
        } => {
            let snapshot = load_snapshot(&config)?;
            let custom = custom_stopwords(stopwords.as_deref(), &config);
            let stop_words = stop_words_with(&custom);

            let tables = QueryTables::build(&snapshot.questions, &stop_words)?;
            let cloud =
                WordCloud::from_questions(&snapshot.questions, &stop_words, DEFAULT_MAX_WORDS);

            let path = if json {
                subsift::output::json::AnalysisExport::new(&snapshot, tables, cloud, custom)
                    .write(&output)?
            } else {
                subsift::output::markdown::generate_report(
                    &snapshot, &tables, &cloud, &custom, &output,
                )?
            };

            println!("{}", format!("Report saved to: {path}").bold());
        }
    }

    Ok(())
}

/// Build the query tables and word cloud for a snapshot and print them.
fn analyze_and_display(snapshot: &Snapshot, config: &Config, args: &AnalysisArgs) -> Result<()> {
    let custom = custom_stopwords(args.stopwords.as_deref(), config);
    let stop_words = stop_words_with(&custom);

    info!(
        questions = snapshot.questions.len(),
        custom_stopwords = custom.len(),
        "Analyzing questions"
    );

    let tables = QueryTables::build(&snapshot.questions, &stop_words)?;
    subsift::output::terminal::display_query_tables(&tables, args.top as usize);

    let cloud = WordCloud::from_questions(&snapshot.questions, &stop_words, DEFAULT_MAX_WORDS);
    subsift::output::terminal::display_word_cloud(&cloud, 20);

    Ok(())
}

/// Custom stopwords from the flag, falling back to SUBSIFT_STOPWORDS.
fn custom_stopwords(flag: Option<&str>, config: &Config) -> Vec<String> {
    parse_custom(flag.unwrap_or(&config.default_stopwords))
}

fn stop_words_with(custom: &[String]) -> StopWords {
    let mut stop_words = StopWords::english();
    stop_words.extend(custom);
    stop_words
}

/// Load the last fetch, or bail with a helpful message.
fn load_snapshot(config: &Config) -> Result<Snapshot> {
    match Snapshot::load_optional(&config.snapshot_path)? {
        Some(snapshot) => Ok(snapshot),
        None => anyhow::bail!("No fetched data found. Run `subsift fetch` first."),
    }
}
