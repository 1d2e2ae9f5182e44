use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a crawled page with its rendered markup and extracted references
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Absolute source URL of the page
    pub url: String,

    /// Raw markup captured after rendering
    pub html: String,

    /// Title of the page (if available)
    pub title: Option<String>,

    /// Image references (src, data-src and inline background images)
    pub images: Vec<String>,

    /// Stylesheet references (link hrefs plus url() refs in style blocks)
    pub css: Vec<String>,

    /// Script references (script[src])
    pub scripts: Vec<String>,

    /// Absolute same-origin links discovered on the page
    pub links: Vec<String>,
}

/// Index built up over a single crawl run.
///
/// Presence in the visited set is the sole de-duplication mechanism: once a
/// URL is marked, it is never navigated to again within the run, no matter
/// how many pages link to it.
#[derive(Debug, Default)]
pub struct CrawlIndex {
    visited: HashSet<String>,
    pages: Vec<PageRecord>,
}

impl CrawlIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL as visited. Returns false if it was already marked.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Check whether a URL has been visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Record a processed page, preserving visit order
    pub fn insert(&mut self, page: PageRecord) {
        self.pages.push(page);
    }

    /// Pages processed so far, in visit order
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Number of pages processed so far
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page has been processed yet
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Derive the metadata document written at the end of a crawl
    pub fn to_metadata(&self, base_url: &str) -> MetadataDocument {
        MetadataDocument {
            base_url: base_url.to_string(),
            scraped_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            total_pages: self.pages.len(),
            pages: self
                .pages
                .iter()
                .map(|page| PageSummary {
                    url: page.url.clone(),
                    title: page.title.clone().unwrap_or_default(),
                    images_count: page.images.len(),
                    css_count: page.css.len(),
                    scripts_count: page.scripts.len(),
                    links_count: page.links.len(),
                })
                .collect(),
        }
    }
}

/// Lookup index written to metadata.json after a crawl completes.
///
/// Serialized camelCase so the on-disk schema stays
/// `{ baseUrl, scrapedAt, totalPages, pages: [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    /// Seed URL the crawl started from
    pub base_url: String,

    /// ISO-8601 timestamp of when the crawl finished
    pub scraped_at: String,

    /// Number of pages in the mirror
    pub total_pages: usize,

    /// Per-page summaries, in visit order
    pub pages: Vec<PageSummary>,
}

/// Per-page entry in the metadata document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub images_count: usize,
    pub css_count: usize,
    pub scripts_count: usize,
    pub links_count: usize,
}
