//! Core queue and orchestration logic.
//!
//! This module contains:
//! - DraftQueue: Durable FIFO store of drafts
//! - Limits: Validation applied at enqueue time
//! - Retry: Backoff policy for content sources
//! - Orchestrator: Fetch, compose and enqueue workflow

pub mod draft_queue;
pub mod limits;
pub mod orchestrator;
pub mod retry;

// Re-export commonly used types
pub use draft_queue::{DraftQueue, QueueError, RepairOutcome};
pub use limits::{DraftLimits, ValidationError, MAX_DRAFT_CHARS};
pub use orchestrator::{ComposedBatch, Orchestrator, WorkflowSummary};
pub use retry::RetryPolicy;
