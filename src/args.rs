use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(about = "Mirrors a WordPress site into a static local copy and serves it")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a live site into the local content directory
    Crawl {
        /// Seed URL; its origin defines the crawl boundary
        url: String,

        /// Output directory for the scraped content [default: ./scraped-content]
        #[arg(short, long)]
        output: Option<String>,

        /// WebDriver server URL [default: http://localhost:4444]
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// Load the full crawler configuration from a JSON file
        #[arg(long)]
        config: Option<String>,
    },

    /// Serve the mirrored site over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Directory holding the scraped content
        #[arg(long, default_value = "./scraped-content")]
        content_dir: String,

        /// Directory holding the hand-authored basic site
        #[arg(long, default_value = "./public")]
        public_dir: String,
    },

    /// Check that every image the stored pages reference exists locally
    Verify {
        /// Directory holding the scraped content
        #[arg(long, default_value = "./scraped-content")]
        content_dir: String,

        /// Origin the pages were scraped from (defaults to the metadata baseUrl)
        #[arg(long)]
        origin: Option<String>,

        /// Re-download missing images found in the stored markup
        #[arg(long)]
        fetch_missing: bool,
    },
}
