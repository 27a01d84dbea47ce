//! Draft composition.
//!
//! A composer turns one content record into one draft. Composers are pure:
//! they never fail, never panic and never touch the queue. Whether the
//! result fits the queue's limits is checked at enqueue time.

pub mod template;

use crate::analysis::AnalyzedContent;
use crate::domain::{ContentRecord, DraftRecord};

pub use template::TemplateComposer;

/// Maps content to a post draft
pub trait DraftComposer: Send + Sync {
    /// Human-readable composer name
    fn name(&self) -> &str;

    /// Compose a pending draft from a record
    fn compose(&self, record: &ContentRecord) -> DraftRecord;

    /// Compose from a record whose analysis is already known
    ///
    /// Composers that score content themselves should reuse `content.analysis`
    /// here. The default ignores it.
    fn compose_with_analysis(&self, content: &AnalyzedContent) -> DraftRecord {
        self.compose(&content.record)
    }
}
