//! Adapter interfaces for external systems.
//!
//! Adapters produce and refine content records:
//! - ContentSource: fetch a URL into a ContentRecord (HTTP)
//! - ContentRefiner: rewrite a record's body (OpenAI-compatible chat API)
//!
//! Adapters own their retries and timeouts. They never see the queue.

pub mod http;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ContentRecord;

pub use http::{validate_url, HttpSource};
pub use openai::{LlmRefiner, Refinement};

/// Produces content records from URLs
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Fetch, extract and categorize a single page
    async fn fetch(&self, url: &str) -> Result<ContentRecord>;
}

/// Optional pre-composition rewrite of a record
///
/// Refiners are infallible from the caller's point of view: on any failure
/// they hand back the input unchanged.
#[async_trait]
pub trait ContentRefiner: Send + Sync {
    /// Human-readable refiner name
    fn name(&self) -> &str;

    /// Return a refined copy of the record
    async fn refine(&self, record: &ContentRecord) -> ContentRecord;
}
