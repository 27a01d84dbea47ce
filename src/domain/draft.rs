//! Draft records held by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::Sector;

/// Delivery status of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Waiting in the queue
    Pending,

    /// Handed out by a dequeue
    Delivered,
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftStatus::Pending => write!(f, "pending"),
            DraftStatus::Delivered => write!(f, "delivered"),
        }
    }
}

/// Draft identifier: `<yyyymmddTHHMMSS.mmm>-<8 hex>`
///
/// The timestamp prefix makes ids sort by creation time; the random suffix
/// keeps drafts created in the same millisecond apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    /// Generate an id for a draft created at `at`
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", at.format("%Y%m%dT%H%M%S%.3f"), &suffix[..8]))
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the id is empty
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for DraftId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DraftId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for DraftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated post draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    /// Unique identifier
    pub id: DraftId,

    /// Post text (at most 3000 characters)
    pub draft_text: String,

    /// URL the draft was derived from
    pub source_url: String,

    /// Sector of the source content
    pub sector: Option<Sector>,

    /// Hashtags, in display order
    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Call to action picked by the composer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,

    /// When the draft was composed
    pub created_at: DateTime<Utc>,

    /// Delivery status
    pub status: DraftStatus,
}

impl DraftRecord {
    /// Create a pending draft with a fresh id
    pub fn new(
        draft_text: impl Into<String>,
        source_url: impl Into<String>,
        sector: Option<Sector>,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: DraftId::generate(created_at),
            draft_text: draft_text.into(),
            source_url: source_url.into(),
            sector,
            hashtags: Vec::new(),
            cta: None,
            created_at,
            status: DraftStatus::Pending,
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<DraftId>) -> Self {
        self.id = id.into();
        self
    }

    /// Add hashtags
    pub fn with_hashtags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hashtags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the call to action
    pub fn with_cta(mut self, cta: impl Into<String>) -> Self {
        self.cta = Some(cta.into());
        self
    }

    /// Length of the draft text in characters
    pub fn char_count(&self) -> usize {
        self.draft_text.chars().count()
    }

    /// First `max_chars` characters of the text, with `...` when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.draft_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }

    /// Consume the record, marking it delivered
    ///
    /// The queue never stores delivered drafts; callers mark a draft once
    /// they have handed it out.
    pub fn into_delivered(mut self) -> Self {
        self.status = DraftStatus::Delivered;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_draft_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let id = DraftId::generate(at);

        assert!(id.as_str().starts_with("20260314T092653.000-"));
        assert_eq!(id.as_str().len(), "20260314T092653.000-".len() + 8);
    }

    #[test]
    fn test_draft_ids_sort_by_time() {
        let earlier = DraftId::generate(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let later = DraftId::generate(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_new_draft_is_pending() {
        let draft = DraftRecord::new("Hello", "https://example.com", None);
        assert_eq!(draft.status, DraftStatus::Pending);
        assert!(draft.hashtags.is_empty());
        assert!(!draft.id.is_empty());
    }

    #[test]
    fn test_preview_counts_characters() {
        let draft = DraftRecord::new("Ünïcödé text that goes on", "https://example.com", None);
        assert_eq!(draft.preview(7), "Ünïcödé...");
        assert_eq!(draft.preview(100), "Ünïcödé text that goes on");
    }

    #[test]
    fn test_into_delivered_only_changes_status() {
        let draft = DraftRecord::new("Hello", "https://example.com", None).with_cta("Thoughts?");
        let delivered = draft.clone().into_delivered();

        assert_eq!(delivered.status, DraftStatus::Delivered);
        assert_eq!(delivered.id, draft.id);
        assert_eq!(delivered.draft_text, draft.draft_text);
        assert_eq!(delivered.cta, draft.cta);
    }

    #[test]
    fn test_cta_omitted_when_absent() {
        let draft = DraftRecord::new("Hello", "https://example.com", None);
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("cta").is_none());
        assert_eq!(json["status"], "pending");
        assert!(json["sector"].is_null());
    }
}
