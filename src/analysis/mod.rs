//! Content analysis.
//!
//! This module contains:
//! - extract: HTML text extraction and cleaning
//! - sector: Keyword-based sector categorization
//! - keywords: Keyword, theme and sentiment scoring
//!
//! Analysis feeds the composer; the queue never sees it.

pub mod extract;
pub mod keywords;
pub mod sector;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{sector_label, ContentRecord};

pub use extract::{clean_text, extract_page, ExtractedPage};
pub use keywords::{analyze, most_common};
pub use sector::{categorize, refine_sector};

/// Keywords kept in aggregate insights
const INSIGHT_KEYWORDS: usize = 20;

/// Themes kept in aggregate insights
const INSIGHT_THEMES: usize = 10;

/// Overall tone of a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Scores for a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Most frequent content words (at most 10)
    pub keywords: Vec<String>,

    /// Most frequent in-sentence bigrams (at most 5)
    pub themes: Vec<String>,

    pub sentiment: Sentiment,
}

/// A record together with its analysis
#[derive(Debug, Clone)]
pub struct AnalyzedContent {
    /// The record, with its sector refined by the keywords
    pub record: ContentRecord,
    pub analysis: Analysis,
}

impl AnalyzedContent {
    /// Analyze a record and refine its sector
    pub fn from_record(record: ContentRecord) -> Self {
        let analysis = analyze(&record);
        let sector = refine_sector(&analysis.keywords, record.sector);
        if sector != record.sector {
            debug!(
                url = %record.url,
                from = sector_label(record.sector),
                to = sector_label(sector),
                "Sector refined from keywords"
            );
        }

        Self {
            record: record.with_sector(sector),
            analysis,
        }
    }
}

/// Aggregate view over a batch of analyzed records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub total_content: usize,
    pub top_keywords: Vec<String>,
    pub top_themes: Vec<String>,

    /// Records per sector label ("uncategorized" for none)
    pub sector_distribution: BTreeMap<String, usize>,

    /// Records per sentiment
    pub sentiment_distribution: BTreeMap<String, usize>,
}

impl Insights {
    /// Aggregate a batch
    pub fn from_analyses(items: &[AnalyzedContent]) -> Self {
        let mut sector_distribution = BTreeMap::new();
        let mut sentiment_distribution = BTreeMap::new();

        for item in items {
            *sector_distribution
                .entry(sector_label(item.record.sector).to_string())
                .or_insert(0) += 1;
            *sentiment_distribution
                .entry(item.analysis.sentiment.to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_content: items.len(),
            top_keywords: most_common(
                items.iter().flat_map(|i| i.analysis.keywords.iter().cloned()),
                INSIGHT_KEYWORDS,
            ),
            top_themes: most_common(
                items.iter().flat_map(|i| i.analysis.themes.iter().cloned()),
                INSIGHT_THEMES,
            ),
            sector_distribution,
            sentiment_distribution,
        }
    }
}
