//! Draft queue CLI commands.
//!
//! Commands for inspecting and draining the queue:
//! - `postdraft queue list` - Show the first drafts in delivery order
//! - `postdraft queue get` - Remove and print the next draft
//! - `postdraft queue peek` - Print the next draft without removing it
//! - `postdraft queue size` - Print the number of queued drafts
//! - `postdraft queue clear` - Remove every draft
//! - `postdraft queue repair` - Back up a corrupt store and reset it

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use super::resolve_queue_path;
use crate::core::{DraftQueue, QueueError, RepairOutcome};
use crate::domain::{sector_label, DraftRecord};

/// Characters shown per draft in `queue list`
const LIST_PREVIEW_CHARS: usize = 50;

/// Queue subcommands
#[derive(Subcommand, Debug)]
pub enum QueueCommands {
    /// List drafts in delivery order
    List {
        /// Maximum number of drafts to show (0 or less shows none)
        #[arg(short, long, default_value = "5", allow_negative_numbers = true)]
        limit: i64,
    },

    /// Remove and print the next draft
    Get,

    /// Print the next draft without removing it
    Peek,

    /// Print the number of queued drafts
    Size,

    /// Remove every draft
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Back up a corrupt store and start with an empty queue
    Repair,
}

/// Execute a queue subcommand
pub async fn execute(command: QueueCommands, queue_file: Option<PathBuf>) -> Result<()> {
    let path = resolve_queue_path(queue_file)?;

    match command {
        QueueCommands::List { limit } => execute_list(path, limit),
        QueueCommands::Get => execute_get(path),
        QueueCommands::Peek => execute_peek(path),
        QueueCommands::Size => execute_size(path),
        QueueCommands::Clear { yes } => execute_clear(path, yes),
        QueueCommands::Repair => execute_repair(path),
    }
}

/// Negative limits show nothing
fn list_limit(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

fn execute_list(path: PathBuf, limit: i64) -> Result<()> {
    let queue = DraftQueue::open(path)?;
    let limit = list_limit(limit);

    if queue.is_empty() {
        println!("No drafts in queue.");
        return Ok(());
    }

    let drafts = queue.list(limit);

    println!();
    println!(
        "{:<4} {:<20} {:<54} {:<20} {:<10}",
        "#", "SECTOR", "PREVIEW", "CREATED", "STATUS"
    );
    println!("{}", "-".repeat(110));

    for (idx, draft) in drafts.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:<54} {:<20} {:<10}",
            idx + 1,
            sector_label(draft.sector),
            draft.preview(LIST_PREVIEW_CHARS),
            draft.created_at.format("%Y-%m-%d %H:%M:%S"),
            draft.status.to_string()
        );
    }

    if queue.size() > drafts.len() {
        println!();
        println!("Showing {} of {} drafts", drafts.len(), queue.size());
    }

    Ok(())
}

fn print_draft(draft: &DraftRecord) {
    println!("ID:              {}", draft.id);
    println!("Sector:          {}", sector_label(draft.sector));
    println!("Source:          {}", draft.source_url);
    println!("Character count: {}", draft.char_count());
    println!("Status:          {}", draft.status);
    if let Some(cta) = &draft.cta {
        println!("CTA:             {}", cta);
    }
    if !draft.hashtags.is_empty() {
        println!("Hashtags:        {}", draft.hashtags.join(" "));
    }
    println!();
    println!("{}", draft.draft_text);
}

fn execute_get(path: PathBuf) -> Result<()> {
    let mut queue = DraftQueue::open(path)?;

    match queue.dequeue() {
        Ok(draft) => {
            let draft = draft.into_delivered();
            println!();
            println!("Retrieved draft:");
            println!("══════════════════════════════════════════════════════════════");
            print_draft(&draft);
            Ok(())
        }
        Err(QueueError::Empty) => {
            println!("No drafts in queue.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn execute_peek(path: PathBuf) -> Result<()> {
    let queue = DraftQueue::open(path)?;

    match queue.peek() {
        Ok(draft) => {
            println!();
            println!("Next draft:");
            println!("══════════════════════════════════════════════════════════════");
            print_draft(draft);
            Ok(())
        }
        Err(QueueError::Empty) => {
            println!("No drafts in queue.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn execute_size(path: PathBuf) -> Result<()> {
    let queue = DraftQueue::open(path)?;
    println!("{}", queue.size());
    Ok(())
}

/// Ask for `y/N` confirmation on stdin
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn execute_clear(path: PathBuf, yes: bool) -> Result<()> {
    let mut queue = DraftQueue::open(path)?;

    if queue.is_empty() {
        println!("Queue is already empty.");
        return Ok(());
    }

    if !yes && !confirm(&format!("Clear {} drafts from the queue?", queue.size()))? {
        println!("Queue not cleared.");
        return Ok(());
    }

    queue.clear()?;
    println!("Queue cleared.");
    Ok(())
}

fn execute_repair(path: PathBuf) -> Result<()> {
    match DraftQueue::repair(&path)? {
        RepairOutcome::Healthy { drafts } => {
            println!("Queue store is healthy ({} drafts). Nothing to repair.", drafts);
        }
        RepairOutcome::Reset { backup } => {
            println!("Corrupt store moved to {}", backup.display());
            println!("Started a fresh queue at {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_limit() {
        assert_eq!(list_limit(5), 5);
        assert_eq!(list_limit(0), 0);
        assert_eq!(list_limit(-3), 0);
    }

    #[test]
    fn test_get_on_empty_queue_succeeds() {
        let temp = TempDir::new().unwrap();
        assert!(execute_get(temp.path().join("q.json")).is_ok());
    }

    #[test]
    fn test_clear_with_yes_empties_store() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("q.json");
        {
            let mut queue = DraftQueue::open(&path).unwrap();
            queue
                .enqueue(DraftRecord::new("Hello", "https://example.com", None))
                .unwrap();
        }

        execute_clear(path.clone(), true).unwrap();
        assert!(DraftQueue::open(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_store_surfaces_queue_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("q.json");
        std::fs::write(&path, "not json").unwrap();

        let err = execute_size(path).unwrap_err();
        assert_eq!(super::super::exit_code(&err), super::super::EXIT_CORRUPT);
    }
}
