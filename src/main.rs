use clap::Parser;
use site_mirror::config::MirrorConfig;
use site_mirror::crawler::Crawler;
use site_mirror::{server, store, verify};
use std::path::Path;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Crawl {
            url,
            output,
            webdriver_url,
            max_pages,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => match MirrorConfig::from_file(&path) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        ::log::error!("Failed to load config {}: {}", path, e);
                        return;
                    }
                },
                None => MirrorConfig::new(&url),
            };
            cfg.start_url = url;
            if let Some(output) = output {
                cfg.output_dir = output;
            }
            if let Some(webdriver_url) = webdriver_url {
                cfg.webdriver_url = webdriver_url;
            }
            if max_pages.is_some() {
                cfg.max_pages = max_pages;
            }
            cfg.apply_env();

            println!("Note: crawling requires a WebDriver server (e.g., ChromeDriver).");
            println!(
                "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
            );

            let start_time = std::time::Instant::now();
            match Crawler::new(cfg).run().await {
                Ok(index) => {
                    ::log::info!(
                        "Processed {} pages in {:.2} seconds",
                        index.len(),
                        start_time.elapsed().as_secs_f64()
                    );
                }
                Err(e) => ::log::error!("Crawl failed: {}", e),
            }
        }

        Command::Serve {
            port,
            content_dir,
            public_dir,
        } => {
            if let Err(e) = server::run(port, Path::new(&content_dir), Path::new(&public_dir)).await
            {
                ::log::error!("Server failed: {}", e);
            }
        }

        Command::Verify {
            content_dir,
            origin,
            fetch_missing,
        } => {
            let content_dir = Path::new(&content_dir);
            // Without an explicit origin, fall back to the recorded baseUrl
            let origin = origin.or_else(|| store::load_metadata(content_dir).map(|m| m.base_url));
            let Some(origin) = origin else {
                ::log::error!("No origin given and no metadata.json to read one from");
                return;
            };

            match verify::verify_images(content_dir, &origin, fetch_missing).await {
                Ok(report) => {
                    println!("Pages checked:     {}", report.pages_checked);
                    println!("Images referenced: {}", report.referenced);
                    println!("Missing:           {}", report.missing.len());
                    for name in &report.missing {
                        let mark = if report.recovered.contains(name) {
                            "recovered"
                        } else {
                            "missing"
                        };
                        println!("  {name} ({mark})");
                    }
                }
                Err(e) => ::log::error!("Verification failed: {}", e),
            }
        }
    }
}
