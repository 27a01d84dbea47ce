//! postdraft - Web articles to a durable queue of post drafts
//!
//! Fetches web pages, extracts and scores their text, composes short
//! social-media post drafts and keeps them in a crash-safe FIFO queue
//! until they are handed out.
//!
//! # Architecture
//!
//! The system is built around the draft queue:
//! - Every mutation is written to a temporary file and atomically renamed
//!   over the store before the in-memory state changes
//! - A corrupt store is reported, never silently reset
//! - One process at a time holds the store through an advisory lock
//!
//! # Modules
//!
//! - `adapters`: Content sources and refiners (HTTP, chat models)
//! - `analysis`: Text extraction, categorization and scoring
//! - `compose`: Draft composers
//! - `core`: Draft queue, limits, retry policy, orchestrator
//! - `domain`: Data structures (ContentRecord, DraftRecord)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Fetch articles and queue drafts
//! postdraft run https://example.com/post --urls-file urls.txt
//!
//! # Inspect and drain the queue
//! postdraft queue list --limit 10
//! postdraft queue get
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod compose;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use core::{DraftQueue, Orchestrator, QueueError, RepairOutcome, ValidationError};
pub use domain::{ContentRecord, DraftId, DraftRecord, DraftStatus, Sector};
