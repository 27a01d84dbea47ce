//! Keyword, theme and sentiment scoring.

use std::collections::{HashMap, HashSet};

use super::extract::split_sentences;
use super::{Analysis, Sentiment};
use crate::domain::ContentRecord;

/// Keywords kept per record
pub const TOP_KEYWORDS: usize = 10;

/// Themes kept per record
pub const TOP_THEMES: usize = 5;

/// English stop words
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "positive",
    "innovative",
    "successful",
    "beneficial",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "poor",
    "negative",
    "problematic",
    "challenging",
    "difficult",
    "issue",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lower-cased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Most frequent items, ties broken by first appearance
pub fn most_common<I>(items: I, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(item, (count, first))| (item, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked.into_iter().take(n).map(|(item, _, _)| item).collect()
}

/// Score a record's body
pub fn analyze(record: &ContentRecord) -> Analysis {
    let words: Vec<String> = tokenize(&record.body)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !is_stop_word(w))
        .collect();

    let bigrams = split_sentences(&record.body).into_iter().flat_map(|sentence| {
        let tokens: Vec<String> = tokenize(sentence)
            .into_iter()
            .filter(|w| !is_stop_word(w))
            .collect();
        tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect::<Vec<_>>()
    });

    let distinct: HashSet<&str> = words.iter().map(String::as_str).collect();
    let positive = POSITIVE_WORDS.iter().filter(|w| distinct.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| distinct.contains(*w)).count();

    let sentiment = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    Analysis {
        keywords: most_common(words.iter().cloned(), TOP_KEYWORDS),
        themes: most_common(bigrams, TOP_THEMES),
        sentiment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &str) -> ContentRecord {
        ContentRecord::new("https://example.com", "Title", body, None)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Lithium-ion cells, 2024's best!"),
            vec!["lithium", "ion", "cells", "2024", "s", "best"]
        );
    }

    #[test]
    fn test_most_common_ties_keep_first_appearance() {
        let items = ["b", "a", "c", "a", "b", "d"].map(String::from);
        assert_eq!(most_common(items, 3), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_keywords_skip_stop_words_and_short_tokens() {
        let analysis = analyze(&record(
            "The battery is new. The battery is cheap. An EV uses the battery.",
        ));

        assert_eq!(analysis.keywords[0], "battery");
        assert!(!analysis.keywords.contains(&"the".to_string()));
        assert!(!analysis.keywords.contains(&"ev".to_string()));
        assert!(analysis.keywords.len() <= TOP_KEYWORDS);
    }

    #[test]
    fn test_themes_stay_within_sentences() {
        let analysis = analyze(&record("Grid storage grows. Grid storage matters."));

        assert_eq!(analysis.themes[0], "grid storage");
        assert!(!analysis.themes.contains(&"grows grid".to_string()));
    }

    #[test]
    fn test_sentiment() {
        let positive = analyze(&record("A great and successful launch, despite one issue."));
        assert_eq!(positive.sentiment, Sentiment::Positive);

        let negative = analyze(&record("A difficult quarter with a poor outlook."));
        assert_eq!(negative.sentiment, Sentiment::Negative);

        // repeated words count once
        let neutral = analyze(&record("Good good good, but bad."));
        assert_eq!(neutral.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_empty_body() {
        let analysis = analyze(&record(""));
        assert!(analysis.keywords.is_empty());
        assert!(analysis.themes.is_empty());
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
    }
}
