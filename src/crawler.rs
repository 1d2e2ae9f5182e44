use crate::assets::{AssetDownloader, AssetKind};
use crate::config::MirrorConfig;
use crate::extract;
use crate::filter::LinkFilter;
use crate::records::{CrawlIndex, PageRecord};
use crate::store;
use fantoccini::{Client, ClientBuilder};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Sequential site crawler driving a WebDriver-rendered browser.
///
/// One page is processed to completion (navigation, extraction, persistence,
/// asset downloads) before the next URL is dequeued, so the visited set and
/// the index are only ever touched from one place.
pub struct Crawler {
    config: MirrorConfig,
}

impl Crawler {
    pub fn new(config: MirrorConfig) -> Self {
        Self { config }
    }

    /// Run one full crawl from the configured seed URL.
    ///
    /// The traversal is an explicit worklist, not call-stack recursion, so
    /// site size only grows the queue. A URL is marked visited before it is
    /// processed and the mark is never rolled back: pages that fail to
    /// render are logged and abandoned, not retried.
    pub async fn run(&self) -> Result<CrawlIndex, Box<dyn std::error::Error>> {
        ::log::info!("Starting crawl of {}", self.config.start_url);

        let seed = Url::parse(&self.config.start_url)?;
        let filter = LinkFilter::new(&seed)?;
        let output_dir = Path::new(&self.config.output_dir).to_path_buf();
        store::ensure_directories(&output_dir)?;
        let downloader = AssetDownloader::new(&output_dir)?;

        let mut client = connect_to_webdriver(&self.config.webdriver_url)
            .await
            .ok_or("could not connect to a WebDriver server")?;

        let mut index = CrawlIndex::new();
        let mut front = VecDeque::new();
        front.push_back(seed.to_string());

        while let Some(url) = front.pop_front() {
            if index.is_visited(&url) {
                ::log::trace!("Skipping already visited: {}", url);
                continue;
            }
            if let Some(max) = self.config.max_pages {
                if index.len() >= max {
                    ::log::info!("Reached page cap of {}, stopping traversal", max);
                    break;
                }
            }
            index.mark_visited(&url);

            match self
                .visit(&mut client, &url, &filter, &downloader, &output_dir)
                .await
            {
                Some(page) => {
                    for link in &page.links {
                        if !index.is_visited(link) {
                            ::log::debug!("Queuing link for crawling: {}", link);
                            front.push_back(link.clone());
                        }
                    }
                    index.insert(page);
                }
                None => ::log::error!("Failed to scrape: {}", url),
            }
        }

        let metadata = index.to_metadata(&self.config.start_url);
        store::write_metadata(&output_dir, &metadata)?;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }

        ::log::info!("Crawl complete - {} pages processed", index.len());
        Ok(index)
    }

    /// Process a single URL: render it, persist its markup and download its
    /// image and stylesheet assets. Returns None when the page is abandoned.
    async fn visit(
        &self,
        client: &mut Client,
        url: &str,
        filter: &LinkFilter,
        downloader: &AssetDownloader,
        output_dir: &Path,
    ) -> Option<PageRecord> {
        ::log::info!("Processing: {}", url);

        let nav_timeout = Duration::from_secs(self.config.navigation_timeout_secs);
        match timeout(nav_timeout, client.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return handle_navigation_error(e, "navigating to", url),
            Err(_) => {
                ::log::error!("Timeout navigating to {}", url);
                return None;
            }
        }

        // Give dynamic content a moment to settle before capturing
        tokio::time::sleep(Duration::from_millis(self.config.settle_millis)).await;

        let html = match client.source().await {
            Ok(source) => source,
            Err(e) => return handle_navigation_error(e, "getting source for", url),
        };

        let extracted = extract::extract(&html);
        let links = filter.extract_links(&html, url);
        ::log::info!("Found {} links in {}", links.len(), url);

        downloader
            .download_all(&extracted.images, url, AssetKind::Image)
            .await;
        downloader
            .download_all(&extracted.css, url, AssetKind::Stylesheet)
            .await;

        let url_path = Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string());
        if let Err(e) = store::save_page_html(output_dir, &url_path, &html) {
            ::log::error!("Failed to save HTML for {}: {}", url, e);
            return None;
        }

        Some(PageRecord {
            url: url.to_string(),
            html,
            title: extracted.title,
            images: extracted.images,
            css: extracted.css,
            scripts: extracted.scripts,
            links,
        })
    }
}

/// Connect to the WebDriver instance, trying common fallback addresses
/// when the configured one is unreachable
async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!("Failed to connect to any WebDriver server");
    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Handles errors that occur during navigation or page source retrieval
fn handle_navigation_error(
    error: fantoccini::error::CmdError,
    context: &str,
    url: &str,
) -> Option<PageRecord> {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, error);
    }
    None
}
