//! Keyword-based sector categorization.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::Sector;

/// Phrases that count toward each sector
fn sector_keywords(sector: Sector) -> &'static [&'static str] {
    match sector {
        Sector::EMobility => &[
            "electric vehicle",
            "ev",
            "battery",
            "charging station",
            "autonomous driving",
            "sustainable mobility",
            "green energy",
            "renewable transport",
            "electric car",
            "lithium-ion",
            "vehicle electrification",
            "smart mobility",
            "e-mobility",
        ],
        Sector::Manufacturing => &[
            "manufacturing",
            "supply chain",
            "automation",
            "industry 4.0",
            "robotics",
            "production line",
            "factory automation",
            "industrial iot",
            "smart manufacturing",
            "lean manufacturing",
            "quality control",
            "production efficiency",
        ],
        Sector::PoliticsGovernance => &[
            "government",
            "policy",
            "regulation",
            "election",
            "legislation",
            "parliament",
            "political",
            "governance",
            "public sector",
            "democracy",
            "constitution",
            "minister",
            "president",
            "law",
            "bill",
            "senate",
        ],
        Sector::AiMl => &[
            "artificial intelligence",
            "machine learning",
            "deep learning",
            "neural network",
            "data science",
            "ai model",
            "computer vision",
            "natural language processing",
            "predictive analytics",
            "algorithm",
            "automation ai",
        ],
        Sector::StartupInnovation => &[
            "startup",
            "innovation",
            "venture capital",
            "tech startup",
            "business model",
            "entrepreneurship",
            "funding round",
            "pitch deck",
            "scalability",
            "disruption",
        ],
    }
}

/// Word-boundary matchers per sector, compiled once
fn matchers() -> &'static [(Sector, Vec<Regex>)] {
    static MATCHERS: OnceLock<Vec<(Sector, Vec<Regex>)>> = OnceLock::new();

    MATCHERS.get_or_init(|| {
        Sector::ALL
            .iter()
            .map(|&sector| {
                let patterns = sector_keywords(sector)
                    .iter()
                    .filter_map(|kw| Regex::new(&format!(r"\b{}\b", regex::escape(kw))).ok())
                    .collect();
                (sector, patterns)
            })
            .collect()
    })
}

/// Keyword match count for every sector, in `Sector::ALL` order
pub fn sector_scores(title: &str, body: &str) -> Vec<(Sector, usize)> {
    let text = format!("{} {}", body, title).to_lowercase();

    matchers()
        .iter()
        .map(|(sector, patterns)| {
            let score = patterns.iter().map(|re| re.find_iter(&text).count()).sum();
            (*sector, score)
        })
        .collect()
}

/// Pick the sector for a page
///
/// The best-scoring sector wins when it is the only one with that score or
/// when it has at least two matches (earlier sectors win ties). Anything
/// weaker is uncategorized.
pub fn categorize(title: &str, body: &str) -> Option<Sector> {
    let scores = sector_scores(title, body);
    let max = scores.iter().map(|(_, score)| *score).max().unwrap_or(0);
    if max == 0 {
        return None;
    }

    let mut top = scores.iter().filter(|(_, score)| *score == max);
    let (winner, _) = top.next()?;
    let unique = top.next().is_none();

    (unique || max >= 2).then_some(*winner)
}

/// Refine a sector from extracted keywords
///
/// Strong keyword stems override the categorized sector; otherwise the
/// categorized sector stands.
pub fn refine_sector(keywords: &[String], base: Option<Sector>) -> Option<Sector> {
    let joined = keywords.join(" ").to_lowercase();
    let has_any = |stems: &[&str]| stems.iter().any(|stem| joined.contains(stem));

    if has_any(&["electric", "vehicle", "battery"]) {
        Some(Sector::EMobility)
    } else if has_any(&["manufactur", "supply", "automation"]) {
        Some(Sector::Manufacturing)
    } else if has_any(&["government", "policy", "regulation"]) {
        Some(Sector::PoliticsGovernance)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_winner() {
        let sector = categorize(
            "New battery plant",
            "The electric vehicle maker opened a battery factory next to a charging station.",
        );
        assert_eq!(sector, Some(Sector::EMobility));
    }

    #[test]
    fn test_word_boundaries() {
        // "ev" inside "every" and "law" inside "lawn" do not count
        assert_eq!(categorize("Garden", "Every lawn needs water."), None);
    }

    #[test]
    fn test_single_match_tie_is_uncategorized() {
        // one match each for politics and startup
        assert_eq!(categorize("", "The senate met a startup."), None);
    }

    #[test]
    fn test_tie_with_two_matches_prefers_earlier_sector() {
        let sector = categorize(
            "",
            "Automation and robotics shape the startup and innovation scene.",
        );
        assert_eq!(sector, Some(Sector::Manufacturing));
    }

    #[test]
    fn test_title_counts() {
        assert_eq!(
            categorize("Machine learning", "Nothing else here."),
            Some(Sector::AiMl)
        );
    }

    #[test]
    fn test_refine_sector() {
        let keywords = vec!["battery".to_string(), "cells".to_string()];
        assert_eq!(refine_sector(&keywords, None), Some(Sector::EMobility));

        let keywords = vec!["manufacturers".to_string()];
        assert_eq!(
            refine_sector(&keywords, Some(Sector::AiMl)),
            Some(Sector::Manufacturing)
        );

        let keywords = vec!["funding".to_string()];
        assert_eq!(
            refine_sector(&keywords, Some(Sector::StartupInnovation)),
            Some(Sector::StartupInnovation)
        );
        assert_eq!(refine_sector(&[], None), None);
    }
}
