//! HTML text extraction and cleaning.
//!
//! Pages are reduced to a title and a block of clean prose: markup,
//! navigation chrome, boilerplate phrases and contact details are stripped
//! and only sentence-sized fragments survive.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Title used when a page has no `<title>`
pub const NO_TITLE: &str = "No title";

/// Selectors tried, in order, for the main content block
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".content",
    "[role=\"main\"]",
    ".blog-post",
];

/// Elements whose text never counts as content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer"];

/// A selector match is accepted once its text is longer than this
const MIN_CONTENT_CHARS: usize = 100;

const MIN_SENTENCE_CHARS: usize = 10;
const MAX_SENTENCE_CHARS: usize = 500;

/// Title and raw (uncleaned) content text of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub text: String,
}

/// Pull the title and main content text out of an HTML document
pub fn extract_page(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let mut text = String::new();
    for raw in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let joined = document
            .select(&selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            continue;
        }
        text = joined;
        if text.chars().count() > MIN_CONTENT_CHARS {
            break;
        }
    }

    if text.is_empty() {
        if let Ok(body) = Selector::parse("body") {
            text = document
                .select(&body)
                .map(element_text)
                .collect::<Vec<_>>()
                .join(" ");
        }
    }

    ExtractedPage { title, text }
}

/// Visible text of an element, skipping script/style and page chrome
fn element_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => parts.push(&**text),
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, parts);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

/// Normalize quotes and runs of punctuation
fn basic_clean(text: &str) -> String {
    static ELLIPSIS: OnceLock<Regex> = OnceLock::new();
    static BANGS: OnceLock<Regex> = OnceLock::new();
    static QUESTIONS: OnceLock<Regex> = OnceLock::new();

    let text = collapse_whitespace(text)
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let text = regex(&ELLIPSIS, r"\.{3,}").replace_all(&text, "...");
    let text = regex(&BANGS, r"!{2,}").replace_all(&text, "!");
    regex(&QUESTIONS, r"\?{2,}")
        .replace_all(&text, "?")
        .into_owned()
}

/// Strip boilerplate phrases, URLs, e-mail addresses and phone numbers
fn remove_boilerplate(text: &str) -> String {
    static PHRASES: OnceLock<Regex> = OnceLock::new();
    static URLS: OnceLock<Regex> = OnceLock::new();
    static EMAILS: OnceLock<Regex> = OnceLock::new();
    static PHONES: OnceLock<Regex> = OnceLock::new();

    let phrases = regex(
        &PHRASES,
        r"(?i)\b(?:menu|navigation|nav|header|footer|sidebar|advertisement|ad|banner|copyright\s+\d{4}|privacy\s+policy|terms\s+of\s+service|contact\s+us|about\s+us|sign\s+in|log\s+in|sign\s+up|register|newsletter|subscribe)\b",
    );

    let text = phrases.replace_all(text, "");
    let text = regex(&URLS, r"https?://\S+").replace_all(&text, "");
    let text = regex(&EMAILS, r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .replace_all(&text, "");
    let text = regex(&PHONES, r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").replace_all(&text, "");

    collapse_whitespace(&text)
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        // Keep runs like "..." or "?!" inside the same sentence
        if let Some(&(_, next)) = chars.peek() {
            if !next.is_whitespace() {
                continue;
            }
        }
        let end = idx + c.len_utf8();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Clean raw page text into prose
///
/// Keeps sentences of 10 to 500 characters, drops case-insensitive
/// duplicates and ends the result with terminal punctuation. Returns an
/// empty string when nothing survives.
pub fn clean_text(raw: &str) -> String {
    let text = remove_boilerplate(&basic_clean(raw));

    let mut seen = HashSet::new();
    let kept: Vec<&str> = split_sentences(&text)
        .into_iter()
        .filter(|s| (MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&s.chars().count()))
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect();

    let mut cleaned = kept.join(" ");
    if !cleaned.is_empty() && !cleaned.ends_with(['.', '!', '?']) {
        cleaned.push('.');
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
<html>
  <head><title> Battery Breakthrough </title><style>body { color: red; }</style></head>
  <body>
    <header>Site header with links</header>
    <nav>Home | News | Contact</nav>
    <article>
      <h1>Battery Breakthrough</h1>
      <p>Researchers announced a new solid-state battery that charges in ten minutes.</p>
      <script>trackVisitor();</script>
      <p>The electric vehicle industry expects the cells to reach production lines by next year.</p>
    </article>
    <footer>Copyright 2024 Example Media</footer>
  </body>
</html>"#;

    #[test]
    fn test_extract_title_and_article() {
        let page = extract_page(ARTICLE_HTML);

        assert_eq!(page.title, "Battery Breakthrough");
        assert!(page.text.contains("solid-state battery"));
        assert!(page.text.contains("production lines"));
        assert!(!page.text.contains("trackVisitor"));
        assert!(!page.text.contains("Site header"));
        assert!(!page.text.contains("Copyright"));
    }

    #[test]
    fn test_extract_falls_back_to_body() {
        let html = "<html><body><div>Plain body text only.</div><footer>Legal</footer></body></html>";
        let page = extract_page(html);

        assert_eq!(page.title, NO_TITLE);
        assert_eq!(page.text, "Plain body text only.");
    }

    #[test]
    fn test_extract_prefers_long_selector_match() {
        let long = "Long paragraph about factory automation. ".repeat(5);
        let html = format!(
            "<html><body><main>Short main.</main><div class=\"entry-content\">{}</div></body></html>",
            long
        );
        let page = extract_page(&html);
        assert!(page.text.starts_with("Long paragraph"));
    }

    #[test]
    fn test_clean_removes_contacts_and_boilerplate() {
        let raw = "Subscribe to our newsletter today. Visit https://example.com/offer for details on the new plant. \
                   Email press@example.com or call 555-123-4567 for comment on the plant.";
        let cleaned = clean_text(raw);

        assert!(!cleaned.to_lowercase().contains("subscribe"));
        assert!(!cleaned.contains("https://"));
        assert!(!cleaned.contains("@example.com"));
        assert!(!cleaned.contains("555-123-4567"));
        assert!(cleaned.contains("for details on the new plant."));
    }

    #[test]
    fn test_clean_drops_short_and_duplicate_sentences() {
        let raw = "Tiny. The factory doubled its output this year. \
                   THE FACTORY DOUBLED ITS OUTPUT THIS YEAR. Robots now handle final assembly";
        let cleaned = clean_text(raw);

        assert_eq!(
            cleaned,
            "The factory doubled its output this year. Robots now handle final assembly."
        );
    }

    #[test]
    fn test_clean_normalizes_punctuation() {
        let cleaned = clean_text("Is this the end of combustion engines??? Nobody knows for sure!!!");
        assert_eq!(cleaned, "Is this the end of combustion engines? Nobody knows for sure!");

        let quoted = clean_text("\u{201C}Grid capacity matters,\u{201D} the minister said.");
        assert_eq!(quoted, "\"Grid capacity matters,\" the minister said.");
    }

    #[test]
    fn test_clean_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("Menu. Footer."), "");
    }

    #[test]
    fn test_split_sentences_keeps_punctuation_runs() {
        let sentences = split_sentences("Wait... what happened? Prices fell 2.5% today.");
        assert_eq!(
            sentences,
            vec!["Wait...", "what happened?", "Prices fell 2.5% today."]
        );
    }
}
