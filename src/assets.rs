use crate::cleaner::basename;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Extensions that reroute a stylesheet-listed reference to the font store.
pub const FONT_EXTENSIONS: [&str; 4] = [".woff", ".woff2", ".ttf", ".otf"];

/// Categories of downloadable assets, each with its own directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Stylesheet,
    Script,
    Font,
}

impl AssetKind {
    /// Directory under the output root that stores this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Stylesheet => "css",
            AssetKind::Script => "scripts",
            AssetKind::Font => "fonts",
        }
    }

    /// Filename used when a URL has no final path segment
    pub fn fallback_name(&self) -> &'static str {
        match self {
            AssetKind::Image => "image.png",
            AssetKind::Stylesheet => "style.css",
            AssetKind::Script => "script.js",
            AssetKind::Font => "font.woff2",
        }
    }
}

/// Check whether a reference carries a font extension (query suffixes allowed)
pub fn is_font_reference(reference: &str) -> bool {
    let lowered = reference.to_lowercase();
    FONT_EXTENSIONS.iter().any(|ext| lowered.contains(ext))
}

/// Downloads page assets into the category directories under the output root.
///
/// Failures are logged and skipped per asset; a bad reference never aborts
/// the page it came from, and nothing is retried.
pub struct AssetDownloader {
    http: reqwest::Client,
    output_dir: PathBuf,
}

impl AssetDownloader {
    pub fn new(output_dir: &Path) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Download every reference in the list, resolved against the page URL.
    ///
    /// Stylesheet lists can carry font files; those are stored under fonts/
    /// instead. Stylesheets themselves are only fetched from absolute or
    /// protocol-relative references.
    pub async fn download_all(&self, refs: &[String], page_url: &str, kind: AssetKind) {
        for reference in refs {
            let effective_kind = if kind == AssetKind::Stylesheet && is_font_reference(reference) {
                AssetKind::Font
            } else {
                kind
            };

            if effective_kind == AssetKind::Stylesheet
                && !(reference.starts_with("http") || reference.starts_with("//"))
            {
                ::log::debug!("Skipping relative stylesheet reference: {}", reference);
                continue;
            }

            if let Err(e) = self.download_one(reference, page_url, effective_kind).await {
                ::log::warn!(
                    "Failed to download {} asset {}: {}",
                    effective_kind.dir_name(),
                    reference,
                    e
                );
            }
        }
    }

    async fn download_one(&self, reference: &str, page_url: &str, kind: AssetKind) -> Result<()> {
        let base = Url::parse(page_url)?;
        let absolute = base.join(reference)?;
        let target = self.output_dir.join(kind.dir_name()).join(local_name(
            &absolute,
            kind,
        ));

        let response = self.http.get(absolute.clone()).send().await?;
        if !response.status().is_success() {
            bail!("HTTP {}", response.status());
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(&target, &bytes).await?;

        ::log::info!(
            "Saved {} asset: {}",
            kind.dir_name(),
            target.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(())
    }
}

/// On-disk name for a downloaded asset: the URL path's basename, or the
/// kind's fallback when the path has none. The basename is the only identity
/// used for storage, so same-named assets from different paths overwrite
/// each other (last write wins).
pub fn local_name(url: &Url, kind: AssetKind) -> String {
    let name = basename(url.path());
    if name.is_empty() {
        kind.fallback_name().to_string()
    } else {
        name
    }
}
