//! Command-line interface for postdraft.
//!
//! Provides commands for running the fetch-and-compose workflow,
//! inspecting and draining the draft queue, and showing configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::adapters::{validate_url, HttpSource, LlmRefiner};
use crate::config;
use crate::core::{DraftQueue, Orchestrator, QueueError, WorkflowSummary};

pub mod queue;

/// Exit code when the store cannot be parsed
pub const EXIT_CORRUPT: i32 = 2;

/// Exit code when another process holds the store
pub const EXIT_LOCKED: i32 = 3;

/// postdraft - Turn web articles into a queue of post drafts
#[derive(Parser, Debug)]
#[command(name = "postdraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Queue store file (defaults to $POSTDRAFT_HOME/drafts_queue.json)
    #[arg(long, global = true, env = "POSTDRAFT_QUEUE")]
    pub queue_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch URLs, compose drafts and add them to the queue
    Run {
        /// URLs to process
        urls: Vec<String>,

        /// File with one URL per line (blank lines and # comments skipped)
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// Refine content with a chat model before composing (needs OPENAI_API_KEY)
        #[arg(long)]
        llm: bool,

        /// Chat model to use with --llm
        #[arg(long)]
        model: Option<String>,

        /// Delay between fetches in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Inspect and manage the draft queue
    Queue {
        #[command(subcommand)]
        command: queue::QueueCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let queue_file = self.queue_file;

        match self.command {
            Commands::Run {
                urls,
                urls_file,
                llm,
                model,
                delay_ms,
            } => {
                run_workflow(queue_file, urls, urls_file, llm, model, delay_ms).await
            }
            Commands::Queue { command } => {
                queue::execute(command, queue_file).await
            }
            Commands::Config => {
                show_config(queue_file).await
            }
        }
    }
}

/// Map an error to the process exit code
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<QueueError>() {
        Some(QueueError::Corrupt { .. }) => EXIT_CORRUPT,
        Some(QueueError::Locked(_)) => EXIT_LOCKED,
        _ => 1,
    }
}

/// Extra guidance printed after an error
pub fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<QueueError>() {
        Some(QueueError::Corrupt { .. }) => {
            Some("Run `postdraft queue repair` to back up the damaged store and start fresh.")
        }
        Some(QueueError::Locked(_)) => {
            Some("Another postdraft process is using this queue. Wait for it to finish.")
        }
        _ => None,
    }
}

/// Store path from the flag, or the configured default
pub(crate) fn resolve_queue_path(queue_file: Option<PathBuf>) -> Result<PathBuf> {
    match queue_file {
        Some(path) => Ok(path),
        None => DraftQueue::default_path(),
    }
}

/// Parse a URL list: one per line, blank lines and `#` comments skipped
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URLs file: {}", path.display()))?;
    Ok(parse_url_list(&content))
}

/// Run the workflow over the given URLs
async fn run_workflow(
    queue_file: Option<PathBuf>,
    mut urls: Vec<String>,
    urls_file: Option<PathBuf>,
    use_llm: bool,
    model: Option<String>,
    delay_ms: Option<u64>,
) -> Result<()> {
    if let Some(path) = urls_file {
        urls.extend(read_url_file(&path)?);
    }

    // Bad URLs are reported once here instead of failing inside the fetch loop
    let urls: Vec<String> = urls
        .into_iter()
        .filter(|url| match validate_url(url) {
            Ok(_) => true,
            Err(e) => {
                warn!(%url, error = %e, "Skipping invalid URL");
                false
            }
        })
        .collect();

    if urls.is_empty() {
        anyhow::bail!("No valid URLs provided. Pass URLs as arguments or use --urls-file <file>");
    }

    let cfg = config::config()?;
    let mut fetch = cfg.fetch.clone();
    if let Some(ms) = delay_ms {
        fetch.delay_between_ms = ms;
    }

    let source = HttpSource::new(&fetch)?;
    let mut orchestrator =
        Orchestrator::new(Box::new(source)).with_delay(fetch.delay_between());

    if use_llm {
        let mut llm = cfg.llm.clone();
        if let Some(model) = model {
            llm.model = model;
        }
        if let Some(refiner) = LlmRefiner::from_env(llm)? {
            orchestrator = orchestrator.with_refiner(Box::new(refiner));
        }
    }

    // The store is opened only after fetching, so `queue` commands keep
    // working while pages download
    let path = resolve_queue_path(queue_file)?;
    let summary = orchestrator.run_at(&urls, &path).await?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &WorkflowSummary) {
    println!();
    println!("Workflow Summary");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("URLs requested:     {}", summary.urls_requested);
    println!("Pages processed:    {}", summary.pages_processed);
    if summary.fetch_failures > 0 {
        println!("Fetch failures:     {}", summary.fetch_failures);
    }
    if summary.duplicates_skipped > 0 {
        println!("Duplicates skipped: {}", summary.duplicates_skipped);
    }
    println!("Drafts queued:      {}", summary.drafts_queued);
    if summary.drafts_rejected > 0 {
        println!("Drafts rejected:    {}", summary.drafts_rejected);
    }
    println!("Queue size:         {}", summary.queue_size);

    if !summary.insights.sector_distribution.is_empty() {
        println!();
        println!("Content by sector:");
        for (sector, count) in &summary.insights.sector_distribution {
            println!("  {:<22} {}", sector, count);
        }
    }

    if !summary.insights.top_keywords.is_empty() {
        println!();
        let top: Vec<&str> = summary
            .insights
            .top_keywords
            .iter()
            .take(10)
            .map(String::as_str)
            .collect();
        println!("Top keywords: {}", top.join(", "));
    }

    println!();
    println!("Next draft in queue:");
    match &summary.next_draft {
        Some(draft) => {
            println!("  Sector:  {}", crate::domain::sector_label(draft.sector));
            println!("  Preview: {}", draft.preview(100));
        }
        None => println!("  No drafts in queue"),
    }
    println!();
}

/// Show resolved configuration
async fn show_config(queue_file: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;

    println!();
    println!("postdraft Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:  {}", cfg.home.display());
    println!("  Queue: {}", resolve_queue_path(queue_file)?.display());
    println!();
    println!("Fetch:");
    println!("  User agent:    {}", cfg.fetch.user_agent);
    println!("  Timeout:       {}s", cfg.fetch.timeout_seconds);
    println!("  Delay between: {}ms", cfg.fetch.delay_between_ms);
    println!(
        "  Retry:         {} attempts, {}ms initial, x{}, {}ms cap",
        cfg.fetch.retry.max_attempts,
        cfg.fetch.retry.initial_delay_ms,
        cfg.fetch.retry.multiplier,
        cfg.fetch.retry.max_delay_ms
    );
    println!();
    println!("Model refinement:");
    println!("  Model:       {}", cfg.llm.model);
    println!("  API base:    {}", cfg.llm.api_base);
    println!("  Max tokens:  {}", cfg.llm.max_tokens);
    println!("  Temperature: {}", cfg.llm.temperature);
    println!(
        "  API key:     {}",
        if std::env::var(crate::adapters::openai::API_KEY_ENV).is_ok() {
            "set"
        } else {
            "not set"
        }
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationError;

    #[test]
    fn test_parse_url_list() {
        let content = "\n# news sources\nhttps://a.example/post\n   \n  https://b.example/post  \n#https://skipped.example\n";
        assert_eq!(
            parse_url_list(content),
            vec!["https://a.example/post", "https://b.example/post"]
        );
    }

    #[test]
    fn test_exit_codes() {
        let locked: anyhow::Error = QueueError::Locked(PathBuf::from("/tmp/q.json")).into();
        assert_eq!(exit_code(&locked), EXIT_LOCKED);
        assert!(error_hint(&locked).is_some());

        let corrupt_source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let corrupt: anyhow::Error = QueueError::Corrupt {
            path: PathBuf::from("/tmp/q.json"),
            source: corrupt_source,
        }
        .into();
        assert_eq!(exit_code(&corrupt), EXIT_CORRUPT);

        // Context does not hide the queue error
        let wrapped = corrupt.context("Failed to open queue");
        assert_eq!(exit_code(&wrapped), EXIT_CORRUPT);

        let validation: anyhow::Error =
            QueueError::from(ValidationError::MissingField("id")).into();
        assert_eq!(exit_code(&validation), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("network down")), 1);
    }

    #[test]
    fn test_cli_parses_queue_file_after_subcommand() {
        let cli = Cli::try_parse_from([
            "postdraft",
            "queue",
            "list",
            "--limit",
            "3",
            "--queue-file",
            "/tmp/q.json",
        ])
        .unwrap();

        assert_eq!(cli.queue_file, Some(PathBuf::from("/tmp/q.json")));
        assert!(matches!(
            cli.command,
            Commands::Queue {
                command: queue::QueueCommands::List { limit: 3 }
            }
        ));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "postdraft",
            "run",
            "https://a.example",
            "--llm",
            "--model",
            "gpt-4o-mini",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                urls, llm, model, ..
            } => {
                assert_eq!(urls, vec!["https://a.example"]);
                assert!(llm);
                assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
