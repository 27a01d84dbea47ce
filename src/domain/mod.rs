//! Domain types for postdraft.
//!
//! This module contains the core data structures:
//! - ContentRecord: Cleaned text of a fetched page
//! - DraftRecord: A composed post draft, the unit the queue stores

pub mod content;
pub mod draft;

// Re-export commonly used types
pub use content::{sector_label, ContentRecord, Sector};
pub use draft::{DraftId, DraftRecord, DraftStatus};
