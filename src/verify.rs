use crate::cleaner::{HtmlCleaner, origin_host};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Outcome of one verification pass over the stored pages
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Stored pages examined
    pub pages_checked: usize,
    /// Distinct image files the served pages reference
    pub referenced: usize,
    /// Referenced files absent from images/
    pub missing: Vec<String>,
    /// Missing files that were re-downloaded from the origin
    pub recovered: Vec<String>,
}

impl VerifyReport {
    /// True when every referenced image exists locally (after any recovery)
    pub fn is_complete(&self) -> bool {
        self.missing.len() == self.recovered.len()
    }
}

/// Check that every image the served pages will reference exists on disk.
///
/// Each stored page is passed through the cleaner, exactly as at serve time,
/// and its `/images/<file>` references are collected and checked against the
/// images directory. With `fetch_missing`, the raw stored markup is searched
/// for the original upload URL of each missing file and the file is fetched
/// from the origin.
pub async fn verify_images(
    content_dir: &Path,
    origin: &str,
    fetch_missing: bool,
) -> Result<VerifyReport> {
    let cleaner = HtmlCleaner::new(origin)?;
    let local_ref_re = Regex::new(r#"/images/([^"'\s)]+)"#)?;
    let pages_dir = content_dir.join("pages");
    let images_dir = content_dir.join("images");

    let mut report = VerifyReport::default();
    let mut referenced = BTreeSet::new();
    let mut raw_pages = Vec::new();

    for entry in fs::read_dir(&pages_dir).context("reading pages directory")? {
        let path = entry?.path();
        if path.extension().map(|ext| ext == "html").unwrap_or(false) {
            let html = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let cleaned = cleaner.clean(&html);
            for caps in local_ref_re.captures_iter(&cleaned) {
                let name = caps[1].split('?').next().unwrap_or(&caps[1]);
                referenced.insert(name.to_string());
            }
            raw_pages.push(html);
            report.pages_checked += 1;
        }
    }

    report.referenced = referenced.len();
    for name in &referenced {
        if !images_dir.join(name).exists() {
            ::log::warn!("Missing image file: {}", name);
            report.missing.push(name.clone());
        }
    }

    if fetch_missing && !report.missing.is_empty() {
        recover_missing(&mut report, &raw_pages, origin, &images_dir).await?;
    }

    ::log::info!(
        "Verified {} pages: {} images referenced, {} missing, {} recovered",
        report.pages_checked,
        report.referenced,
        report.missing.len(),
        report.recovered.len()
    );
    Ok(report)
}

/// Re-download missing images whose original upload URL still appears in the
/// stored markup. Files with no recoverable URL are left in the report.
async fn recover_missing(
    report: &mut VerifyReport,
    raw_pages: &[String],
    origin: &str,
    images_dir: &Path,
) -> Result<()> {
    let host = regex::escape(&origin_host(origin));
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    for name in report.missing.clone() {
        let pattern = format!(
            r#"https?://{host}/wp-content/uploads/[^"']*{}[^"']*"#,
            regex::escape(&name)
        );
        let source_re = Regex::new(&pattern)?;

        let Some(found) = raw_pages
            .iter()
            .find_map(|html| source_re.find(html).map(|m| m.as_str().to_string()))
        else {
            ::log::warn!("No source URL found for missing image: {}", name);
            continue;
        };
        let source_url = found.split('?').next().unwrap_or(&found);

        match fetch_to(&http, source_url, &images_dir.join(&name)).await {
            Ok(()) => {
                ::log::info!("Recovered image {} from {}", name, source_url);
                report.recovered.push(name);
            }
            Err(e) => ::log::warn!("Failed to recover {}: {}", name, e),
        }
    }
    Ok(())
}

async fn fetch_to(http: &reqwest::Client, url: &str, target: &Path) -> Result<()> {
    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }
    let bytes = response.bytes().await?;
    tokio::fs::write(target, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;

    #[tokio::test]
    async fn test_reports_missing_and_present_images() {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();

        store::save_page_html(
            dir.path(),
            "/",
            concat!(
                r#"<img src="https://example.com/wp-content/uploads/present.png">"#,
                r#"<img src="https://example.com/wp-content/uploads/absent.png?ver=3">"#,
            ),
        )
        .unwrap();
        fs::write(dir.path().join("images").join("present.png"), b"png").unwrap();

        let report = verify_images(dir.path(), "https://example.com", false)
            .await
            .unwrap();
        assert_eq!(report.pages_checked, 1);
        assert_eq!(report.referenced, 2);
        assert_eq!(report.missing, vec!["absent.png"]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_complete_mirror_reports_nothing_missing() {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();

        store::save_page_html(
            dir.path(),
            "/",
            r#"<img src="https://example.com/wp-content/uploads/logo.webp">"#,
        )
        .unwrap();
        fs::write(dir.path().join("images").join("logo.webp"), b"webp").unwrap();

        let report = verify_images(dir.path(), "https://example.com", false)
            .await
            .unwrap();
        assert_eq!(report.referenced, 1);
        assert!(report.missing.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_counts_references_once_across_pages() {
        let dir = tempfile::tempdir().unwrap();
        store::ensure_directories(dir.path()).unwrap();

        let markup = r#"<img src="https://example.com/wp-content/uploads/shared.png">"#;
        store::save_page_html(dir.path(), "/", markup).unwrap();
        store::save_page_html(dir.path(), "/sobre", markup).unwrap();

        let report = verify_images(dir.path(), "https://example.com", false)
            .await
            .unwrap();
        assert_eq!(report.pages_checked, 2);
        assert_eq!(report.referenced, 1);
    }
}
