//! Template-based post composer.
//!
//! A draft is built from fixed paragraphs in this order:
//! hook, summary, insight (when there are keywords and themes), strategic
//! view, engagement question, call to action, hashtags.
//!
//! Where a paragraph has alternatives the choice is a stable hash of the
//! sector and sentiment, so the same record always yields the same draft.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use super::DraftComposer;
use crate::analysis::{analyze, Analysis, AnalyzedContent, Sentiment};
use crate::core::limits::MAX_DRAFT_CHARS;
use crate::domain::{sector_label, ContentRecord, DraftRecord, Sector};

/// Hashtags attached to one draft at most
pub const MAX_HASHTAGS: usize = 8;

/// Room left below the limit when a draft is cut short
const TRUNCATION_MARGIN: usize = 50;

const ELLIPSIS: &str = "...";

const CALLS_TO_ACTION: &[&str] = &[
    "I'd genuinely value your perspective on this. What are your thoughts?",
    "This is a conversation worth having. Please share your insights below.",
    "Your experience in this area would be incredibly valuable. What's your take?",
    "Let's continue this important discussion. What's your professional viewpoint?",
    "I'm particularly interested in hearing from others in the field. What's your experience?",
];

fn sector_hashtags(sector: Option<Sector>) -> &'static [&'static str] {
    match sector {
        Some(Sector::EMobility) => &[
            "#ElectricVehicles",
            "#EV",
            "#SustainableMobility",
            "#GreenEnergy",
            "#Innovation",
        ],
        Some(Sector::Manufacturing) => &[
            "#Manufacturing",
            "#Industry40",
            "#Automation",
            "#SupplyChain",
            "#Engineering",
        ],
        Some(Sector::PoliticsGovernance) => &[
            "#Policy",
            "#Governance",
            "#Politics",
            "#Regulation",
            "#PublicSector",
        ],
        Some(Sector::AiMl) => &[
            "#ArtificialIntelligence",
            "#MachineLearning",
            "#AI",
            "#DataScience",
            "#Innovation",
        ],
        Some(Sector::StartupInnovation) => &[
            "#Startups",
            "#Innovation",
            "#VentureCapital",
            "#Entrepreneurship",
            "#Business",
        ],
        None => &[
            "#Business",
            "#Technology",
            "#News",
            "#Insights",
            "#ProfessionalDevelopment",
        ],
    }
}

/// Composer that fills fixed paragraph templates
#[derive(Debug, Clone)]
pub struct TemplateComposer {
    max_chars: usize,
}

impl Default for TemplateComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateComposer {
    pub fn new() -> Self {
        Self {
            max_chars: MAX_DRAFT_CHARS,
        }
    }

    /// Use a different length cap (never above what the queue accepts)
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.min(MAX_DRAFT_CHARS),
        }
    }

    /// Compose from a record and an analysis computed elsewhere
    pub fn compose_analyzed(&self, record: &ContentRecord, analysis: &Analysis) -> DraftRecord {
        let sector = record.sector;
        let name = sector_name(sector);

        let mut paragraphs = vec![hook(name, analysis.sentiment)];
        paragraphs.push(summary(&record.body, analysis));
        if !analysis.keywords.is_empty() && !analysis.themes.is_empty() {
            paragraphs.push(insight(analysis));
        }
        paragraphs.push(strategic_view(name, analysis.sentiment));
        paragraphs.push(engagement_question(sector, name, analysis.sentiment));

        let cta = CALLS_TO_ACTION[choose(sector_label(sector), CALLS_TO_ACTION.len())];
        paragraphs.push(cta.to_string());

        let hashtags = hashtags(sector, analysis);
        if !hashtags.is_empty() {
            paragraphs.push(hashtags.join(" "));
        }

        let text = polish(&paragraphs.join("\n\n"), self.max_chars);

        DraftRecord::new(text, record.url.clone(), sector)
            .with_hashtags(hashtags)
            .with_cta(cta)
    }
}

impl DraftComposer for TemplateComposer {
    fn name(&self) -> &str {
        "template"
    }

    fn compose(&self, record: &ContentRecord) -> DraftRecord {
        let analysis = analyze(record);
        self.compose_analyzed(record, &analysis)
    }

    fn compose_with_analysis(&self, content: &AnalyzedContent) -> DraftRecord {
        self.compose_analyzed(&content.record, &content.analysis)
    }
}

fn sector_name(sector: Option<Sector>) -> &'static str {
    sector.map(|s| s.display_name()).unwrap_or("industry")
}

/// Stable index into `len` alternatives
fn choose(key: &str, len: usize) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) % len.max(1) as u64) as usize
}

fn hook(name: &str, sentiment: Sentiment) -> String {
    match sentiment {
        Sentiment::Positive => format!(
            "As someone deeply immersed in the {} landscape, I'm genuinely excited about the transformative developments unfolding before our eyes. 🚀 Let me share my perspective on why these changes represent a pivotal moment for our industry.",
            name
        ),
        Sentiment::Negative => format!(
            "Having closely followed the {} sector, I'm increasingly concerned about the challenges that demand our immediate attention. 🤔 The recent developments highlight systemic issues that we can no longer afford to ignore.",
            name
        ),
        Sentiment::Neutral => format!(
            "In my ongoing analysis of {} trends, I've noticed some fascinating patterns emerging that deserve deeper reflection. 📈 Allow me to articulate my thoughts on where we're heading and what it means for professionals like us.",
            name
        ),
    }
}

/// Up to two keyword-bearing sentences from the opening of the body
fn summary(body: &str, analysis: &Analysis) -> String {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    let splitter =
        SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]+").expect("static pattern is valid"));

    let sentences: Vec<&str> = splitter
        .split(body.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(5)
        .collect();

    let markers: Vec<String> = analysis
        .keywords
        .iter()
        .take(3)
        .chain(analysis.themes.iter().take(2))
        .map(|m| m.to_lowercase())
        .collect();

    let mut key_sentences: Vec<&str> = sentences
        .iter()
        .copied()
        .filter(|s| {
            let lower = s.to_lowercase();
            markers.iter().any(|m| lower.contains(m.as_str()))
        })
        .take(2)
        .collect();

    if key_sentences.is_empty() {
        key_sentences.extend(sentences.first().copied());
    }

    if key_sentences.is_empty() {
        return "The content explores critical developments that are reshaping our understanding of current industry dynamics.".to_string();
    }

    format!(
        "Delving into the details, {}. This development represents a significant shift in how we approach these challenges.",
        lowercase_first(&key_sentences.join(". "))
    )
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn insight(analysis: &Analysis) -> String {
    let themes: Vec<&str> = analysis.themes.iter().take(3).map(String::as_str).collect();
    let lead_keyword = analysis
        .keywords
        .first()
        .map(String::as_str)
        .unwrap_or("these elements");

    let connections = format!(
        "The interconnected themes of {} particularly resonate with me. When we examine how {} intersects with {}, we begin to see the broader implications for our field.",
        themes.join(", "),
        lead_keyword,
        themes.first().copied().unwrap_or("these trends")
    );

    let perspective = match analysis.sentiment {
        Sentiment::Positive => "What excites me most is how these developments create new opportunities for collaboration and growth across traditional boundaries.",
        Sentiment::Negative => "This situation underscores the urgent need for strategic adaptation and proactive problem-solving within our industry.",
        Sentiment::Neutral => "These patterns suggest we're at an inflection point that demands careful consideration and strategic planning.",
    };

    format!("{} {}", connections, perspective)
}

fn strategic_view(name: &str, sentiment: Sentiment) -> String {
    match sentiment {
        Sentiment::Positive => format!(
            "Looking ahead, I believe these {} advancements will fundamentally reshape our operational landscape. The question isn't whether change is coming; it's how we position ourselves to lead it.",
            name
        ),
        Sentiment::Negative => format!(
            "The challenges we're facing in {} aren't insurmountable, but they do require a fundamental rethinking of our current approaches. Success will depend on our ability to innovate while maintaining stability.",
            name
        ),
        Sentiment::Neutral => format!(
            "As we navigate these {} developments, the key will be maintaining strategic flexibility while building on our core competencies. The organizations that thrive will be those that can adapt without losing their fundamental identity.",
            name
        ),
    }
}

fn engagement_question(sector: Option<Sector>, name: &str, sentiment: Sentiment) -> String {
    let questions = match sentiment {
        Sentiment::Positive => [
            format!("How do you see these {} innovations impacting your work?", name),
            "What opportunities do you think these developments create for our industry?".to_string(),
            "How are you preparing your organization for these transformative changes?".to_string(),
        ],
        Sentiment::Negative => [
            format!("What strategies are you employing to navigate these {} challenges?", name),
            "How is your organization adapting to these industry headwinds?".to_string(),
            "What lessons can we learn from these developments to strengthen our position?".to_string(),
        ],
        Sentiment::Neutral => [
            format!("Where do you see the {} sector heading in the next 12-18 months?", name),
            "How are these trends influencing your strategic planning?".to_string(),
            "What aspects of these developments are you most focused on right now?".to_string(),
        ],
    };

    let key = format!("{}{}", sector_label(sector), sentiment);
    let index = choose(&key, questions.len());
    questions[index].clone()
}

/// `battery storage` -> `#BatteryStorage`
fn to_hashtag<'a>(words: impl Iterator<Item = &'a str>) -> String {
    let mut tag = String::from("#");
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            tag.extend(first.to_uppercase());
            tag.push_str(&chars.as_str().to_lowercase());
        }
    }
    tag
}

/// Sector set, up to two keyword tags and one theme tag; no duplicates
fn hashtags(sector: Option<Sector>, analysis: &Analysis) -> Vec<String> {
    let mut tags: Vec<String> = sector_hashtags(sector).iter().map(|t| t.to_string()).collect();

    for keyword in analysis.keywords.iter().take(2) {
        if keyword.chars().count() <= 3 {
            continue;
        }
        let tag = to_hashtag(keyword.split_whitespace().filter(|w| w.chars().count() > 2));
        if tag.chars().count() > 4 && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if let Some(theme) = analysis.themes.first() {
        let words: Vec<&str> = theme.split_whitespace().take(2).collect();
        if words.len() > 1 {
            let tag = to_hashtag(words.into_iter());
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    tags.truncate(MAX_HASHTAGS);
    tags
}

/// Enforce the length cap and tidy blank lines
///
/// An over-long draft is cut at the last paragraph that fits, leaving room
/// for a trailing `...`.
fn polish(draft: &str, max_chars: usize) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let blank_runs =
        BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("static pattern is valid"));

    let mut text = blank_runs.replace_all(draft.trim(), "\n\n").into_owned();

    if text.chars().count() > max_chars && max_chars < ELLIPSIS.len() {
        // No room for the ellipsis itself
        text = text.chars().take(max_chars).collect();
    } else if text.chars().count() > max_chars {
        let budget = max_chars.saturating_sub(TRUNCATION_MARGIN).max(ELLIPSIS.len());
        let room = budget - ELLIPSIS.len();
        let mut kept = String::new();
        for paragraph in text.split("\n\n") {
            let separator = if kept.is_empty() { 0 } else { 2 };
            if kept.chars().count() + separator + paragraph.chars().count() > room {
                break;
            }
            if !kept.is_empty() {
                kept.push_str("\n\n");
            }
            kept.push_str(paragraph);
        }

        // A single paragraph longer than the budget is cut mid-text
        if kept.is_empty() {
            kept = text.chars().take(room).collect();
        }

        text = format!("{}{}", kept.trim_end(), ELLIPSIS);
    }

    text
}
