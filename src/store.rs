use crate::records::MetadataDocument;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory holding the stored page markup
pub const PAGES_DIR: &str = "pages";
/// Name of the crawl index file
pub const METADATA_FILE: &str = "metadata.json";

/// Category directories created under the output root. scripts/ is part of
/// the layout but stays empty: CMS scripts are never downloaded or served.
const LAYOUT: [&str; 5] = ["pages", "images", "css", "scripts", "fonts"];

/// Create the output root and its category directories
pub fn ensure_directories(output_dir: &Path) -> Result<()> {
    for dir in LAYOUT {
        fs::create_dir_all(output_dir.join(dir))
            .with_context(|| format!("creating output directory {dir}"))?;
    }
    Ok(())
}

/// Derive the stored filename for a page URL path.
///
/// The root path becomes index.html; any other path drops its leading and
/// trailing slashes and replaces the remaining separators with underscores.
/// Combined with trailing-slash link normalization this maps /a and /a/ to
/// the same file, so the crawler and the resolver always agree on a name.
pub fn page_filename(url_path: &str) -> String {
    let trimmed = url_path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}.html", trimmed.replace('/', "_"))
    }
}

/// Persist a page's raw markup under pages/, returning the file path
pub fn save_page_html(output_dir: &Path, url_path: &str, html: &str) -> Result<PathBuf> {
    let filename = page_filename(url_path);
    let filepath = output_dir.join(PAGES_DIR).join(&filename);
    fs::write(&filepath, html).with_context(|| format!("writing page file {filename}"))?;
    ::log::info!("Saved page: {}", filename);
    Ok(filepath)
}

/// Serialize the metadata document to metadata.json
pub fn write_metadata(output_dir: &Path, metadata: &MetadataDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(output_dir.join(METADATA_FILE), json).context("writing metadata.json")?;
    ::log::info!("Saved metadata for {} pages", metadata.total_pages);
    Ok(())
}

/// Load metadata.json if present and parseable.
///
/// A missing or corrupt file is reported and treated as no metadata; the
/// caller degrades to serving only the basic site.
pub fn load_metadata(content_dir: &Path) -> Option<MetadataDocument> {
    let path = content_dir.join(METADATA_FILE);
    if !path.exists() {
        ::log::warn!("No metadata.json in {}", content_dir.display());
        return None;
    }
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                ::log::error!("Failed to parse metadata.json: {}", e);
                None
            }
        },
        Err(e) => {
            ::log::error!("Failed to read metadata.json: {}", e);
            None
        }
    }
}
