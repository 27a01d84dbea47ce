//! Structural limits for drafts entering the queue.
//!
//! Every draft is checked before anything is written:
//! - Text length (characters, not bytes)
//! - Required fields
//! - Initial status

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DraftRecord, DraftStatus};

/// Maximum draft length accepted by the queue
pub const MAX_DRAFT_CHARS: usize = 3000;

/// Limits applied at enqueue time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLimits {
    /// Maximum draft text length in characters (default: 3000)
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    MAX_DRAFT_CHARS
}

impl Default for DraftLimits {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

impl DraftLimits {
    /// Validate a draft's structure
    pub fn validate(&self, draft: &DraftRecord) -> Result<(), ValidationError> {
        if draft.id.is_empty() {
            return Err(ValidationError::MissingField("id"));
        }

        if draft.draft_text.trim().is_empty() {
            return Err(ValidationError::MissingField("draft_text"));
        }

        if draft.source_url.trim().is_empty() {
            return Err(ValidationError::MissingField("source_url"));
        }

        let chars = draft.char_count();
        if chars > self.max_chars {
            return Err(ValidationError::TextTooLong {
                actual: chars,
                limit: self.max_chars,
            });
        }

        if draft.status != DraftStatus::Pending {
            return Err(ValidationError::InvalidStatus(draft.status));
        }

        Ok(())
    }
}

/// Reasons a draft is rejected at enqueue time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Draft text too long: {actual} > {limit} characters")]
    TextTooLong { actual: usize, limit: usize },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Draft must be pending to enqueue, got {0}")]
    InvalidStatus(DraftStatus),

    #[error("Draft id already queued: {0}")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str) -> DraftRecord {
        DraftRecord::new(text, "https://example.com/post", None)
    }

    #[test]
    fn test_default_limits() {
        let limits = DraftLimits::default();
        assert_eq!(limits.max_chars, 3000);
    }

    #[test]
    fn test_length_boundary() {
        let limits = DraftLimits::default();

        assert!(limits.validate(&draft(&"x".repeat(3000))).is_ok());

        let result = limits.validate(&draft(&"x".repeat(3001)));
        assert_eq!(
            result,
            Err(ValidationError::TextTooLong {
                actual: 3001,
                limit: 3000
            })
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let limits = DraftLimits::default();
        // 3000 two-byte characters is 6000 bytes but within the limit
        assert!(limits.validate(&draft(&"é".repeat(3000))).is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let limits = DraftLimits::default();

        let result = limits.validate(&draft("   "));
        assert_eq!(result, Err(ValidationError::MissingField("draft_text")));

        let no_url = DraftRecord::new("Hello", "", None);
        assert_eq!(
            limits.validate(&no_url),
            Err(ValidationError::MissingField("source_url"))
        );

        let no_id = draft("Hello").with_id("");
        assert_eq!(limits.validate(&no_id), Err(ValidationError::MissingField("id")));
    }

    #[test]
    fn test_delivered_draft_rejected() {
        let limits = DraftLimits::default();
        let mut delivered = draft("Hello");
        delivered.status = DraftStatus::Delivered;

        assert_eq!(
            limits.validate(&delivered),
            Err(ValidationError::InvalidStatus(DraftStatus::Delivered))
        );
    }
}
