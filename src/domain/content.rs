//! Content records produced by a content source.
//!
//! A record is the cleaned text of one web page plus the sector it was
//! categorized into. Records are immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Industry sector a page was categorized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sector {
    /// Electric vehicles, batteries, charging
    EMobility,

    /// Production, automation, supply chain
    Manufacturing,

    /// Government, policy, regulation
    PoliticsGovernance,

    /// Artificial intelligence and machine learning
    AiMl,

    /// Startups, venture funding, innovation
    StartupInnovation,
}

impl Sector {
    /// All sectors, in scoring order
    pub const ALL: [Sector; 5] = [
        Sector::EMobility,
        Sector::Manufacturing,
        Sector::PoliticsGovernance,
        Sector::AiMl,
        Sector::StartupInnovation,
    ];

    /// Stable machine name (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::EMobility => "e-mobility",
            Sector::Manufacturing => "manufacturing",
            Sector::PoliticsGovernance => "politics-governance",
            Sector::AiMl => "ai-ml",
            Sector::StartupInnovation => "startup-innovation",
        }
    }

    /// Human-readable name used in generated text
    pub fn display_name(&self) -> &'static str {
        match self {
            Sector::EMobility => "E-Mobility",
            Sector::Manufacturing => "Manufacturing",
            Sector::PoliticsGovernance => "Politics & Governance",
            Sector::AiMl => "AI & Machine Learning",
            Sector::StartupInnovation => "Startup & Innovation",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "e-mobility" | "emobility" | "ev" => Ok(Sector::EMobility),
            "manufacturing" => Ok(Sector::Manufacturing),
            "politics-governance" | "politics" | "governance" => Ok(Sector::PoliticsGovernance),
            "ai-ml" | "ai" | "ml" => Ok(Sector::AiMl),
            "startup-innovation" | "startup" | "innovation" => Ok(Sector::StartupInnovation),
            _ => anyhow::bail!("Unknown sector: {}", s),
        }
    }
}

/// Display label for an optional sector (`None` is "uncategorized")
pub fn sector_label(sector: Option<Sector>) -> &'static str {
    sector.map(|s| s.as_str()).unwrap_or("uncategorized")
}

/// Cleaned text content of a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Page URL
    pub url: String,

    /// Page title
    pub title: String,

    /// Cleaned body text
    pub body: String,

    /// Categorized sector (None = uncategorized)
    pub sector: Option<Sector>,

    /// When the page was fetched
    pub scraped_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Create a record stamped with the current time
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        sector: Option<Sector>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            body: body.into(),
            sector,
            scraped_at: Utc::now(),
        }
    }

    /// Copy of this record with a different body
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..self.clone()
        }
    }

    /// Copy of this record with a different sector
    pub fn with_sector(&self, sector: Option<Sector>) -> Self {
        Self {
            sector,
            ..self.clone()
        }
    }

    /// Fingerprint of the body text (first 16 hex chars of SHA256)
    ///
    /// Two pages that extract to the same text share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let normalized = self.body.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut hasher = Sha256::new();
        hasher.update(normalized.to_lowercase().as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }
}
