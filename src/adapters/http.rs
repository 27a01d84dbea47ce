//! HTTP content source.
//!
//! Fetches a page with browser-like headers, retries transient failures
//! with exponential backoff, then extracts, cleans and categorizes the text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{error, info, instrument, warn};
use url::Url;

use super::ContentSource;
use crate::analysis::{categorize, clean_text, extract_page};
use crate::config::FetchSettings;
use crate::core::RetryPolicy;
use crate::domain::{sector_label, ContentRecord};

/// Check that a string is an absolute http(s) URL
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("Unsupported URL scheme '{}': {}", other, raw),
    }
}

/// Content source backed by reqwest
pub struct HttpSource {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpSource {
    /// Build a source from fetch settings
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
        })
    }

    /// Single GET; non-2xx statuses are errors
    async fn get_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from {}", url))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }

    /// GET, waiting out the retry schedule between failed tries
    async fn get_with_retry(&self, url: &Url) -> Result<String> {
        let mut waits = self.retry.schedule();
        let mut attempt = 1u32;

        loop {
            info!(%url, attempt, "Fetching");

            let err = match self.get_html(url).await {
                Ok(html) => return Ok(html),
                Err(e) => e,
            };

            let Some(delay) = waits.next() else {
                error!(%url, attempt, error = %err, "Fetch failed permanently");
                return Err(err.context(format!("Giving up after {} attempts", attempt)));
            };

            warn!(
                %url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Turn a fetched HTML document into a categorized record
pub fn record_from_html(url: &str, html: &str) -> ContentRecord {
    let page = extract_page(html);
    let body = clean_text(&page.text);
    let sector = categorize(&page.title, &body);
    ContentRecord::new(url, page.title, body, sector)
}

#[async_trait]
impl ContentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<ContentRecord> {
        let parsed = validate_url(url)?;
        let html = self.get_with_retry(&parsed).await?;

        let record = record_from_html(url, &html);
        info!(
            chars = record.body.chars().count(),
            sector = sector_label(record.sector),
            "Scraped and cleaned page"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sector;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/post").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("/relative/path").is_err());
    }

    #[test]
    fn test_record_from_html() {
        let html = r#"<html><head><title>Factory news</title></head><body>
            <nav>Home</nav>
            <article>
              <p>The plant added robotics to every production line this spring.</p>
              <p>Managers say automation cut the supply chain delays in half.</p>
            </article>
        </body></html>"#;

        let record = record_from_html("https://example.com/factory", html);
        assert_eq!(record.url, "https://example.com/factory");
        assert_eq!(record.title, "Factory news");
        assert!(record.body.contains("robotics"));
        assert_eq!(record.sector, Some(Sector::Manufacturing));
    }

    #[test]
    fn test_source_builds_from_default_settings() {
        let source = HttpSource::new(&FetchSettings::default()).unwrap();
        assert_eq!(source.name(), "http");
        assert_eq!(source.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url_without_request() {
        let settings = FetchSettings {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        let source = HttpSource::new(&settings).unwrap();

        let err = source.fetch("mailto:someone@example.com").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme"));
    }

    #[tokio::test]
    async fn test_retries_follow_schedule_then_give_up() {
        let settings = FetchSettings {
            retry: RetryPolicy {
                max_attempts: 2,
                initial_delay_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let source = HttpSource::new(&settings).unwrap();

        // Nothing listens on the discard port
        let err = source.fetch("http://127.0.0.1:9/post").await.unwrap_err();
        assert!(err.to_string().contains("Giving up after 2 attempts"));
    }
}
